//! Storage layer for OncoDB.
//!
//! Owns the embedded engine: opening it in memory or in a scratch
//! directory, loading each catalog table from its JSON dataset, and
//! remembering the inferred column kinds so rows can be read back faithfully.

mod config;
mod engine;
mod functions;
mod loader;
mod schema;

pub use config::{StorageConfig, StorageMode, DATABASE_FILE_NAME};
pub use engine::Engine;
pub use functions::{fold_case, FOLD_CASE};
pub use loader::{DatasetSource, LoadedTable, Loader, MAX_VALIDATION_SAMPLES};
pub use schema::{ColumnDef, ColumnKind, TableSchema};
