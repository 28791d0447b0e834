//! Embedded engine handle.

use std::collections::HashMap;

use parking_lot::Mutex;
use rusqlite::Connection;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::config::{StorageConfig, StorageMode, DATABASE_FILE_NAME};
use super::functions;
use super::loader::{DatasetSource, Loader};
use super::schema::TableSchema;
use crate::catalog::Catalog;
use crate::error::Error;

/// An initialized, read-only engine holding every catalog table.
///
/// The engine is built and loaded in one step by [`Engine::open`]; a value
/// of this type is always fully loaded. Statements are serialized through
/// an internal lock, so a shared reference may be used from any thread.
/// Dropping the engine (or calling [`Engine::close`]) releases the
/// connection and removes any temporary files.
pub struct Engine {
    conn: Mutex<Connection>,
    catalog: Catalog,
    schemas: HashMap<String, TableSchema>,
    scratch: Option<TempDir>,
}

impl Engine {
    /// Open an engine and load every catalog table from `sources`.
    ///
    /// Every table in the catalog needs a source. Fails on the first table
    /// that cannot be read, parsed, or validated.
    pub fn open(
        config: &StorageConfig,
        catalog: Catalog,
        sources: &HashMap<String, DatasetSource>,
    ) -> Result<Self, Error> {
        let (conn, scratch) = open_connection(config)?;

        for name in sources.keys() {
            if !catalog.contains(name) {
                warn!(table = %name, "Ignoring dataset source for unknown table");
            }
        }

        let mut schemas = HashMap::with_capacity(catalog.len());
        {
            let loader = Loader::new(&conn);
            for table in catalog.tables() {
                let source = sources.get(&table.name).ok_or_else(|| {
                    Error::Initialization(format!("no dataset source for table {}", table.name))
                })?;
                let loaded = loader.load(table, source)?;
                schemas.insert(table.name.clone(), loaded.schema);
            }
        }

        conn.execute_batch("PRAGMA query_only = ON;")
            .map_err(|e| Error::Initialization(format!("cannot seal engine: {e}")))?;

        info!(
            tables = catalog.len(),
            mode = ?config.mode,
            "Engine ready"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            catalog,
            schemas,
            scratch,
        })
    }

    /// Table definitions.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Inferred columns of a loaded table.
    pub fn schema(&self, table: &str) -> Option<&TableSchema> {
        self.schemas.get(table)
    }

    /// Run a closure with exclusive access to the connection.
    pub(crate) fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Check that the engine still answers statements.
    pub fn is_connected(&self) -> bool {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok()
        })
    }

    /// Release the connection and remove temporary files.
    ///
    /// Failures are logged; the engine is gone either way.
    pub fn close(self) {
        if let Err((_, e)) = self.conn.into_inner().close() {
            warn!(error = %e, "Failed to close engine connection");
        }
        if let Some(dir) = self.scratch {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "Failed to remove scratch directory");
            }
        }
        debug!("Engine closed");
    }
}

fn open_connection(config: &StorageConfig) -> Result<(Connection, Option<TempDir>), Error> {
    let init_err = |e: rusqlite::Error| Error::Initialization(format!("cannot open engine: {e}"));

    let (conn, scratch) = match config.mode {
        StorageMode::Memory => (Connection::open_in_memory().map_err(init_err)?, None),
        StorageMode::TempFile => {
            let mut builder = tempfile::Builder::new();
            builder.prefix("oncodb-");
            let dir = match &config.scratch_dir {
                Some(parent) => builder.tempdir_in(parent),
                None => builder.tempdir(),
            }
            .map_err(|e| Error::Initialization(format!("cannot create scratch directory: {e}")))?;

            let path = dir.path().join(DATABASE_FILE_NAME);
            debug!(path = %path.display(), "Opening file-backed engine");
            (Connection::open(&path).map_err(init_err)?, Some(dir))
        }
    };

    functions::register(&conn)
        .map_err(|e| Error::Initialization(format!("cannot register engine functions: {e}")))?;
    Ok((conn, scratch))
}
