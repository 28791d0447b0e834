//! OncoDB Core - catalog, filter translation, query planning, and execution.
//!
//! This crate turns structured filter maps into parameterized statements
//! over a fixed set of read-only tables loaded into an embedded engine,
//! runs them, and hands back ordered records.

pub mod catalog;
pub mod error;
pub mod query;
pub mod shape;
pub mod storage;
pub mod value;

pub use catalog::{Catalog, TableDef};
pub use error::Error;
pub use query::{
    ExecutionGateway, FilterSpec, FilterTranslator, FilterValue, LookupKey, QueryParam, QueryPlan,
    QueryPlanBuilder,
};
pub use shape::{CountSummary, GroupCount, ResultShaper};
pub use storage::{ColumnKind, DatasetSource, Engine, StorageConfig, StorageMode, TableSchema};
pub use value::{FieldValue, Record};
