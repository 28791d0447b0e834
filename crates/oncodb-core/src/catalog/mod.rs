//! Table catalog for OncoDB.
//!
//! The catalog is the allow-list of queryable tables together with the fields
//! that carry identity, display name, provider, and array semantics.

mod catalog;
mod ident;
mod table;

pub use catalog::Catalog;
pub use ident::{is_valid_identifier, validate_field};
pub use table::TableDef;
