//! Storage configuration.

use std::path::PathBuf;

/// File name of the engine database inside the scratch directory.
pub const DATABASE_FILE_NAME: &str = "oncodb.sqlite3";

/// Where the engine keeps its tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Everything lives in process memory.
    #[default]
    Memory,
    /// A database file inside a temporary directory, removed on shutdown.
    TempFile,
}

/// Configuration for the embedded engine.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Storage mode.
    pub mode: StorageMode,
    /// Parent directory for the temporary directory. None uses the system
    /// temp location. Ignored in memory mode.
    pub scratch_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// In-memory storage.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Temporary on-disk storage.
    pub fn temp_file() -> Self {
        Self {
            mode: StorageMode::TempFile,
            scratch_dir: None,
        }
    }

    /// Set the storage mode.
    pub fn with_mode(mut self, mode: StorageMode) -> Self {
        self.mode = mode;
        self
    }

    /// Place the temporary directory under `dir`.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}
