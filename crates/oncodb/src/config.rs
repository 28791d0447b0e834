//! Database configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use oncodb_core::catalog::Catalog;
use oncodb_core::storage::{DatasetSource, StorageConfig, StorageMode};

/// Default directory holding the dataset files.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// OncoDB configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one JSON file per table.
    pub data_dir: PathBuf,

    /// Engine storage settings.
    pub storage: StorageConfig,

    /// Per-table source files that replace `<data_dir>/<file>`.
    pub sources: HashMap<String, PathBuf>,
}

impl Config {
    /// Create a configuration reading datasets from `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            storage: StorageConfig::default(),
            sources: HashMap::new(),
        }
    }

    /// Set the storage mode.
    pub fn with_storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage.mode = mode;
        self
    }

    /// Place temporary engine files under `dir`.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.scratch_dir = Some(dir.into());
        self
    }

    /// Read `table` from `path` instead of the data directory.
    pub fn with_source(mut self, table: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.sources.insert(table.into(), path.into());
        self
    }

    /// Source file for a table.
    pub fn source_path(&self, table: &str, file: &str) -> PathBuf {
        self.sources
            .get(table)
            .cloned()
            .unwrap_or_else(|| self.data_dir.join(file))
    }

    /// Sources for every table in `catalog`.
    pub fn dataset_sources(&self, catalog: &Catalog) -> HashMap<String, DatasetSource> {
        catalog
            .tables()
            .map(|table| {
                let path = self.source_path(&table.name, &table.source_file);
                (table.name.clone(), DatasetSource::File(path))
            })
            .collect()
    }

    /// Data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.storage.mode, StorageMode::Memory);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new("/srv/oncodb")
            .with_storage_mode(StorageMode::TempFile)
            .with_scratch_dir("/var/tmp")
            .with_source("pap_programs", "/opt/pap-2026.json");

        assert_eq!(config.storage.mode, StorageMode::TempFile);
        assert_eq!(config.storage.scratch_dir, Some(PathBuf::from("/var/tmp")));
        assert_eq!(
            config.source_path("pap_programs", "pap.json"),
            PathBuf::from("/opt/pap-2026.json")
        );
        assert_eq!(
            config.source_path("mrd_tests", "mrd.json"),
            PathBuf::from("/srv/oncodb/mrd.json")
        );
    }

    #[test]
    fn test_dataset_sources_cover_catalog() {
        let config = Config::new("/data");
        let sources = config.dataset_sources(&Catalog::standard());

        assert_eq!(sources.len(), 5);
        assert_eq!(
            sources.get("hct_tests"),
            Some(&DatasetSource::File(PathBuf::from("/data/hct.json")))
        );
    }
}
