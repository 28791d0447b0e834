//! Column kinds inferred at ingestion.

use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value as JsonValue};

use crate::catalog::TableDef;

/// Storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Stored as 0/1, read back as a boolean.
    Boolean,
    /// 64-bit integer.
    Integer,
    /// Floating point.
    Real,
    /// Text.
    Text,
    /// JSON array of strings, read back as a string array.
    StringArray,
    /// Nested JSON kept as text.
    Json,
    /// Scalars of different types; each value keeps its own storage class.
    Mixed,
}

impl ColumnKind {
    /// Declared column type.
    pub fn decl_type(&self) -> &'static str {
        match self {
            ColumnKind::Boolean => "BOOLEAN",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Text | ColumnKind::StringArray | ColumnKind::Json => "TEXT",
            // No declared type means no affinity, so numbers stay numbers.
            ColumnKind::Mixed => "",
        }
    }

    /// Kind of a single source value; None for null.
    pub fn of(value: &JsonValue) -> Option<ColumnKind> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(_) => Some(ColumnKind::Boolean),
            JsonValue::Number(n) if n.is_i64() => Some(ColumnKind::Integer),
            JsonValue::Number(_) => Some(ColumnKind::Real),
            JsonValue::String(_) => Some(ColumnKind::Text),
            JsonValue::Array(items) if items.iter().all(is_scalar) => Some(ColumnKind::StringArray),
            JsonValue::Array(_) | JsonValue::Object(_) => Some(ColumnKind::Json),
        }
    }

    /// Widen two kinds seen in the same column.
    pub fn merge(self, other: ColumnKind) -> ColumnKind {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Real) | (Real, Integer) => Real,
            (StringArray | Json, _) | (_, StringArray | Json) => Json,
            _ => Mixed,
        }
    }

    /// Convert a source value into its stored representation.
    pub fn encode(&self, value: Option<&JsonValue>) -> SqlValue {
        let value = match value {
            None | Some(JsonValue::Null) => return SqlValue::Null,
            Some(value) => value,
        };

        match (self, value) {
            (ColumnKind::Boolean, JsonValue::Bool(b)) => SqlValue::Integer(i64::from(*b)),
            (ColumnKind::Integer, JsonValue::Number(n)) if n.is_i64() => {
                n.as_i64().map_or(SqlValue::Null, SqlValue::Integer)
            }
            (ColumnKind::Real, JsonValue::Number(n)) => {
                n.as_f64().map_or(SqlValue::Null, SqlValue::Real)
            }
            (ColumnKind::Mixed, JsonValue::Bool(b)) => SqlValue::Integer(i64::from(*b)),
            (ColumnKind::Mixed, JsonValue::Number(n)) => match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
            },
            (ColumnKind::StringArray, JsonValue::Array(items)) => {
                let elements: Vec<String> = items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(element_text)
                    .collect();
                SqlValue::Text(JsonValue::from(elements).to_string())
            }
            (ColumnKind::StringArray, scalar) => {
                SqlValue::Text(JsonValue::from(vec![element_text(scalar)]).to_string())
            }
            (_, JsonValue::String(s)) => SqlValue::Text(s.clone()),
            (_, other) => SqlValue::Text(other.to_string()),
        }
    }
}

fn is_scalar(value: &JsonValue) -> bool {
    !matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

fn element_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A column and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name as it appears in the source.
    pub name: String,
    /// Storage kind.
    pub kind: ColumnKind,
}

/// Columns of a loaded table, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Infer columns from source records.
    ///
    /// Columns appear in first-seen key order. Declared array fields are
    /// always string arrays; required and array fields missing from the
    /// source are appended so they can still be validated and filtered.
    pub fn infer(table: &TableDef, records: &[Map<String, JsonValue>]) -> Self {
        let mut columns: Vec<(String, Option<ColumnKind>)> = Vec::new();

        for record in records {
            for (key, value) in record {
                let kind = ColumnKind::of(value);
                match columns.iter_mut().find(|(name, _)| name == key) {
                    Some((_, existing)) => {
                        *existing = match (*existing, kind) {
                            (Some(a), Some(b)) => Some(a.merge(b)),
                            (a, b) => a.or(b),
                        };
                    }
                    None => columns.push((key.clone(), kind)),
                }
            }
        }

        for field in table.required_fields() {
            if !columns.iter().any(|(name, _)| name == field) {
                columns.push((field.to_string(), Some(ColumnKind::Text)));
            }
        }
        for field in &table.array_fields {
            if !columns.iter().any(|(name, _)| name == field) {
                columns.push((field.clone(), None));
            }
        }

        let columns = columns
            .into_iter()
            .map(|(name, kind)| {
                let kind = if table.is_array_field(&name) {
                    ColumnKind::StringArray
                } else {
                    kind.unwrap_or(ColumnKind::Text)
                };
                ColumnDef { name, kind }
            })
            .collect();

        Self { columns }
    }

    /// All columns in order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Look up a column. Names match ASCII case-insensitively, as the
    /// engine resolves them.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    /// Kind of a column, if the table has it.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(|c| c.kind)
    }
}
