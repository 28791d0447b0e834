//! The table allow-list.

use super::ident::is_valid_identifier;
use super::table::TableDef;
use crate::error::Error;

/// Array fields shared by every test table.
const TEST_ARRAY_FIELDS: [&str; 3] = ["cancerTypes", "clinicalSettings", "biomarkersReported"];

/// The fixed set of tables that may be queried.
///
/// A table name that is not registered here never reaches statement text.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<TableDef>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard diagnostic-test catalog.
    pub fn standard() -> Self {
        Self::new()
            .with_table(
                TableDef::new("mrd_tests", "id")
                    .with_array_fields(TEST_ARRAY_FIELDS)
                    .with_source_file("mrd.json"),
            )
            .with_table(
                TableDef::new("ecd_tests", "id")
                    .with_array_fields(TEST_ARRAY_FIELDS)
                    .with_source_file("ecd.json"),
            )
            .with_table(
                TableDef::new("hct_tests", "id")
                    .with_array_fields(TEST_ARRAY_FIELDS)
                    .with_array_field("cancerTypesAssessed")
                    .with_source_file("hct.json"),
            )
            .with_table(
                TableDef::new("tds_tests", "id")
                    .with_array_fields(TEST_ARRAY_FIELDS)
                    .with_source_file("tds.json"),
            )
            .with_table(
                TableDef::new("pap_programs", "id")
                    .with_name_field("vendorName")
                    .with_provider_field("vendorName")
                    .with_source_file("pap.json"),
            )
    }

    /// Register a table. A later definition with the same name replaces the
    /// earlier one.
    ///
    /// # Panics
    ///
    /// Panics if the table or any of its key fields does not satisfy the
    /// identifier grammar; catalogs are built from static definitions.
    pub fn with_table(mut self, table: TableDef) -> Self {
        for name in [
            &table.name,
            &table.identity_field,
            &table.name_field,
            &table.provider_field,
        ]
        .into_iter()
        .chain(table.array_fields.iter())
        {
            assert!(is_valid_identifier(name), "invalid identifier in catalog: {name}");
        }
        self.tables.retain(|t| t.name != table.name);
        self.tables.push(table);
        self
    }

    /// Look up an allow-listed table.
    pub fn table(&self, name: &str) -> Result<&TableDef, Error> {
        if !is_valid_identifier(name) {
            return Err(Error::validation(format!("invalid table name: {name}")));
        }
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::validation(format!("invalid table name: {name}")))
    }

    /// Check whether a table is allow-listed.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    /// All registered tables, in registration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.iter()
    }

    /// Names of all registered tables.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
