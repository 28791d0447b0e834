//! Dataset ingestion.
//!
//! Each catalog table is created from a JSON array of objects. Columns and
//! their kinds are inferred from the records, rows are inserted in one
//! transaction, and every row is then checked for the table's required
//! fields.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use super::schema::TableSchema;
use crate::catalog::TableDef;
use crate::error::Error;

/// Maximum number of violating rows reported by required-field validation.
pub const MAX_VALIDATION_SAMPLES: usize = 5;

/// Where a table's records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// A JSON file on disk.
    File(PathBuf),
    /// JSON text held in memory.
    Inline(String),
}

impl DatasetSource {
    /// A JSON file source.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DatasetSource::File(path.into())
    }

    /// An in-memory JSON source.
    pub fn inline(json: impl Into<String>) -> Self {
        DatasetSource::Inline(json.into())
    }

    /// Read and parse the source as a list of records.
    pub fn read_records(&self) -> Result<Vec<Map<String, JsonValue>>, Error> {
        let text = match self {
            DatasetSource::File(path) => fs::read_to_string(path).map_err(|e| {
                Error::Initialization(format!("cannot read {}: {e}", path.display()))
            })?,
            DatasetSource::Inline(json) => json.clone(),
        };

        serde_json::from_str(&text)
            .map_err(|e| Error::Initialization(format!("cannot parse {self}: {e}")))
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::File(path) => write!(f, "{}", path.display()),
            DatasetSource::Inline(_) => write!(f, "inline dataset"),
        }
    }
}

impl From<&Path> for DatasetSource {
    fn from(path: &Path) -> Self {
        DatasetSource::File(path.to_path_buf())
    }
}

impl From<PathBuf> for DatasetSource {
    fn from(path: PathBuf) -> Self {
        DatasetSource::File(path)
    }
}

/// Outcome of loading one table.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    /// Inferred columns.
    pub schema: TableSchema,
    /// Rows inserted.
    pub rows: u64,
}

/// Creates and fills catalog tables on a connection.
pub struct Loader<'a> {
    conn: &'a Connection,
}

impl<'a> Loader<'a> {
    /// Create a loader over a connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Load one table from its source and validate required fields.
    pub fn load(&self, table: &TableDef, source: &DatasetSource) -> Result<LoadedTable, Error> {
        let records = source.read_records()?;
        let schema = TableSchema::infer(table, &records);

        self.create_table(table, &schema)?;
        let rows = self.insert_records(table, &schema, &records)?;
        self.validate_required_fields(table)?;

        info!(
            table = %table.name,
            source = %source,
            rows,
            columns = schema.columns().len(),
            "Loaded table"
        );

        Ok(LoadedTable { schema, rows })
    }

    fn create_table(&self, table: &TableDef, schema: &TableSchema) -> Result<(), Error> {
        let columns: Vec<String> = schema
            .columns()
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.decl_type()).trim_end().to_string())
            .collect();

        let ddl = format!(
            "CREATE TABLE {} ({});\nCREATE INDEX {} ON {} ({});",
            quote_ident(&table.name),
            columns.join(", "),
            quote_ident(&format!("idx_{}_{}", table.name, table.identity_field)),
            quote_ident(&table.name),
            quote_ident(&table.identity_field),
        );
        debug!(table = %table.name, ddl = %ddl, "Creating table");

        self.conn
            .execute_batch(&ddl)
            .map_err(|e| Error::Initialization(format!("cannot create table {}: {e}", table.name)))
    }

    fn insert_records(
        &self,
        table: &TableDef,
        schema: &TableSchema,
        records: &[Map<String, JsonValue>],
    ) -> Result<u64, Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let columns = schema.columns();
        let names: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            quote_ident(&table.name),
            names.join(", ")
        );

        let insert_err =
            |e: rusqlite::Error| Error::Initialization(format!("cannot load table {}: {e}", table.name));

        let tx = self.conn.unchecked_transaction().map_err(insert_err)?;
        {
            let mut stmt = tx.prepare(&sql).map_err(insert_err)?;
            for record in records {
                let values = columns.iter().map(|c| c.kind.encode(record.get(&c.name)));
                stmt.execute(params_from_iter(values)).map_err(insert_err)?;
            }
        }
        tx.commit().map_err(insert_err)?;

        Ok(records.len() as u64)
    }

    fn validate_required_fields(&self, table: &TableDef) -> Result<(), Error> {
        let required = table.required_fields();
        let missing: Vec<String> = required
            .iter()
            .map(|field| {
                let column = quote_ident(field);
                format!("{column} IS NULL OR trim(CAST({column} AS TEXT)) = ''")
            })
            .collect();
        let condition = missing.join(" OR ");
        let table_name = quote_ident(&table.name);

        let query_err = |e: rusqlite::Error| {
            Error::Initialization(format!("cannot validate table {}: {e}", table.name))
        };

        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {table_name} WHERE {condition}"),
                [],
                |row| row.get(0),
            )
            .map_err(query_err)?;

        if count == 0 {
            return Ok(());
        }

        let projection: Vec<String> = required
            .iter()
            .map(|field| format!("CAST({} AS TEXT)", quote_ident(field)))
            .collect();
        let sql = format!(
            "SELECT {} FROM {table_name} WHERE {condition} ORDER BY rowid LIMIT {MAX_VALIDATION_SAMPLES}",
            projection.join(", ")
        );

        let mut stmt = self.conn.prepare(&sql).map_err(query_err)?;
        let samples = stmt
            .query_map([], |row| {
                let mut parts = Vec::with_capacity(required.len());
                for (i, field) in required.iter().enumerate() {
                    let value: Option<String> = row.get(i)?;
                    parts.push(format!("{field}={}", value.as_deref().unwrap_or("null")));
                }
                Ok(parts.join(", "))
            })
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        Err(Error::DataValidation {
            table: table.name.clone(),
            count: count as u64,
            fields: required.iter().map(|f| f.to_string()).collect(),
            samples,
        })
    }
}

/// Quote an identifier for use in DDL and statements.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::ColumnKind;

    fn mrd_table() -> TableDef {
        TableDef::new("mrd_tests", "id").with_array_fields(["cancerTypes"])
    }

    #[test]
    fn test_load_inline_dataset() {
        let conn = Connection::open_in_memory().unwrap();
        let source = DatasetSource::inline(
            r#"[
                {"id": "mrd-1", "name": "Signatera", "vendor": "Natera", "cancerTypes": ["Colorectal", "Breast"], "fdaApproved": true},
                {"id": "mrd-2", "name": "Reveal", "vendor": "Guardant", "cancerTypes": ["Colorectal"], "fdaApproved": false}
            ]"#,
        );

        let loaded = Loader::new(&conn).load(&mrd_table(), &source).unwrap();
        assert_eq!(loaded.rows, 2);
        assert_eq!(loaded.schema.kind_of("fdaApproved"), Some(ColumnKind::Boolean));

        let stored: String = conn
            .query_row("SELECT cancerTypes FROM mrd_tests WHERE id = 'mrd-1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, r#"["Colorectal","Breast"]"#);
    }

    #[test]
    fn test_empty_dataset_loads() {
        let conn = Connection::open_in_memory().unwrap();
        let loaded = Loader::new(&conn)
            .load(&mrd_table(), &DatasetSource::inline("[]"))
            .unwrap();
        assert_eq!(loaded.rows, 0);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM mrd_tests", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_missing_required_fields() {
        let conn = Connection::open_in_memory().unwrap();
        let source = DatasetSource::inline(
            r#"[
                {"id": "mrd-1", "name": "Signatera", "vendor": "Natera"},
                {"id": "mrd-2", "name": "  ", "vendor": "Guardant"},
                {"id": "mrd-3", "name": "Haystack"}
            ]"#,
        );

        let err = Loader::new(&conn).load(&mrd_table(), &source).unwrap_err();
        match err {
            Error::DataValidation { table, count, fields, samples } => {
                assert_eq!(table, "mrd_tests");
                assert_eq!(count, 2);
                assert_eq!(fields, vec!["id", "name", "vendor"]);
                assert_eq!(
                    samples,
                    vec![
                        "id=mrd-2, name=  , vendor=Guardant".to_string(),
                        "id=mrd-3, name=Haystack, vendor=null".to_string(),
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_samples_are_capped() {
        let conn = Connection::open_in_memory().unwrap();
        let records: Vec<String> = (0..8).map(|i| format!(r#"{{"id": "x-{i}"}}"#)).collect();
        let source = DatasetSource::inline(format!("[{}]", records.join(",")));

        let err = Loader::new(&conn).load(&mrd_table(), &source).unwrap_err();
        match err {
            Error::DataValidation { count, samples, .. } => {
                assert_eq!(count, 8);
                assert_eq!(samples.len(), MAX_VALIDATION_SAMPLES);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_sources() {
        let conn = Connection::open_in_memory().unwrap();
        let loader = Loader::new(&conn);

        let err = loader
            .load(&mrd_table(), &DatasetSource::file("/nonexistent/mrd.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));

        let err = loader
            .load(&mrd_table(), &DatasetSource::inline(r#"{"id": 1}"#))
            .unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("name"), "\"name\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
