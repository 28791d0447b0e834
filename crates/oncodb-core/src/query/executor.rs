//! Plan execution.

use rusqlite::params_from_iter;
use rusqlite::types::ValueRef;
use tracing::debug;

use crate::error::Error;
use crate::storage::{ColumnKind, Engine};
use crate::value::{FieldValue, Record};

use super::plan::QueryPlan;

/// Runs plans against an engine and materializes rows as records.
///
/// Statement text and parameters always travel separately; nothing is
/// spliced into the text here.
pub struct ExecutionGateway<'a> {
    engine: &'a Engine,
}

impl<'a> ExecutionGateway<'a> {
    /// Create a gateway over an initialized engine.
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Execute a plan and return every row as a record, in result order.
    pub fn execute(&self, plan: &QueryPlan) -> Result<Vec<Record>, Error> {
        debug!(table = plan.table(), sql = plan.sql(), params = ?plan.params(), "Executing query");

        let schema = self.engine.schema(plan.table());
        let records = self.engine.with_connection(|conn| {
            let mut stmt = conn.prepare(plan.sql()).map_err(execution_error)?;
            let columns: Vec<(String, Option<ColumnKind>)> = stmt
                .column_names()
                .into_iter()
                .map(|name| {
                    let kind = schema.and_then(|s| s.kind_of(name));
                    (name.to_string(), kind)
                })
                .collect();

            let mut rows = stmt
                .query(params_from_iter(plan.params()))
                .map_err(execution_error)?;

            let mut records = Vec::new();
            while let Some(row) = rows.next().map_err(execution_error)? {
                let mut fields = Vec::with_capacity(columns.len());
                for (i, (name, kind)) in columns.iter().enumerate() {
                    let value = row.get_ref(i).map_err(execution_error)?;
                    fields.push((name.clone(), materialize(value, *kind)?));
                }
                records.push(Record::new(fields));
            }
            Ok::<_, Error>(records)
        })?;

        debug!(table = plan.table(), rows = records.len(), "Query complete");
        Ok(records)
    }

    /// Execute a plan whose single row holds a single count.
    pub fn execute_count(&self, plan: &QueryPlan) -> Result<u64, Error> {
        debug!(table = plan.table(), sql = plan.sql(), params = ?plan.params(), "Executing count");

        let count: i64 = self.engine.with_connection(|conn| {
            conn.query_row(plan.sql(), params_from_iter(plan.params()), |row| row.get(0))
                .map_err(execution_error)
        })?;

        u64::try_from(count)
            .map_err(|_| Error::QueryExecution(format!("negative count {count} from {}", plan.table())))
    }
}

fn execution_error(e: rusqlite::Error) -> Error {
    Error::QueryExecution(e.to_string())
}

/// Convert a raw engine value using the column's ingestion kind when known.
fn materialize(value: ValueRef<'_>, kind: Option<ColumnKind>) -> Result<FieldValue, Error> {
    Ok(match (value, kind) {
        (ValueRef::Null, _) => FieldValue::Null,
        (ValueRef::Integer(i), Some(ColumnKind::Boolean)) => FieldValue::Bool(i != 0),
        (ValueRef::Integer(i), _) => FieldValue::Int(i),
        (ValueRef::Real(f), _) => FieldValue::Float(f),
        (ValueRef::Text(bytes), Some(ColumnKind::StringArray)) => {
            let elements: Vec<String> = serde_json::from_slice(bytes)
                .map_err(|e| Error::QueryExecution(format!("malformed array value: {e}")))?;
            FieldValue::StringArray(elements)
        }
        (ValueRef::Text(bytes), _) | (ValueRef::Blob(bytes), _) => {
            FieldValue::String(String::from_utf8_lossy(bytes).into_owned())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_by_kind() {
        assert_eq!(
            materialize(ValueRef::Integer(1), Some(ColumnKind::Boolean)).unwrap(),
            FieldValue::Bool(true)
        );
        assert_eq!(
            materialize(ValueRef::Integer(0), Some(ColumnKind::Boolean)).unwrap(),
            FieldValue::Bool(false)
        );
        assert_eq!(materialize(ValueRef::Integer(7), None).unwrap(), FieldValue::Int(7));
        assert_eq!(materialize(ValueRef::Real(0.5), None).unwrap(), FieldValue::Float(0.5));
        assert_eq!(materialize(ValueRef::Null, Some(ColumnKind::StringArray)).unwrap(), FieldValue::Null);
        assert_eq!(
            materialize(ValueRef::Text(br#"["Lung","Breast"]"#), Some(ColumnKind::StringArray)).unwrap(),
            FieldValue::StringArray(vec!["Lung".into(), "Breast".into()])
        );
        assert_eq!(
            materialize(ValueRef::Text(b"Natera"), Some(ColumnKind::Text)).unwrap(),
            FieldValue::String("Natera".into())
        );
    }

    #[test]
    fn test_malformed_array_is_query_error() {
        let err = materialize(ValueRef::Text(b"not json"), Some(ColumnKind::StringArray)).unwrap_err();
        assert!(matches!(err, Error::QueryExecution(_)));
    }
}
