//! OncoDB - an embedded, read-only query layer over diagnostic test catalogs.
//!
//! Datasets are loaded from JSON files into an embedded engine at open
//! time and validated; afterwards the [`Database`] answers searches,
//! lookups, comparisons, counts, and distinct-value listings.
//!
//! # Example
//!
//! ```ignore
//! use oncodb::{Config, Database, FilterSpec, SearchOptions};
//!
//! let db = Database::open(&Config::new("./data"))?;
//! let filters = FilterSpec::new().with("vendor", "natera").with("min_sensitivity", 90);
//! let tests = db.search("mrd_tests", &filters, &SearchOptions::new().with_limit(10))?;
//! ```

pub mod category;
pub mod config;
pub mod criteria;
pub mod database;
pub mod error;

pub use category::{Category, CategoryInfo};
pub use config::{Config, DEFAULT_DATA_DIR};
pub use criteria::{
    parse_list, parse_optional_list, Criteria, EcdCriteria, HctCriteria, MrdCriteria, PapCriteria,
    SearchOptions, TdsCriteria,
};
pub use database::Database;
pub use error::{Error, ErrorReport};

pub use oncodb_core::query::{FilterSpec, FilterValue};
pub use oncodb_core::shape::{CountSummary, GroupCount};
pub use oncodb_core::storage::StorageMode;
pub use oncodb_core::value::{FieldValue, Record};
