//! Database handle combining the engine, catalog, and category rules.

use tracing::{debug, info};

use oncodb_core::catalog::Catalog;
use oncodb_core::query::{ExecutionGateway, FilterSpec, LookupKey, QueryPlanBuilder};
use oncodb_core::shape::{CountSummary, ResultShaper};
use oncodb_core::storage::Engine;
use oncodb_core::value::Record;

use crate::category::{Category, CategoryInfo};
use crate::config::Config;
use crate::criteria::{Criteria, SearchOptions};
use crate::error::Error;

/// Example list shown when a comparison names no tests.
const COMPARE_HINT: &str =
    "Provide comma-separated list like 'mrd-1,mrd-2' or 'Signatera,Guardant Reveal'";

/// A loaded, read-only OncoDB instance.
///
/// All operations take `&self`; wrap the handle in an `Arc` to share it
/// across threads.
pub struct Database {
    engine: Engine,
}

impl Database {
    /// Open a database with the standard catalog.
    pub fn open(config: &Config) -> Result<Self, Error> {
        Self::open_with_catalog(config, Catalog::standard())
    }

    /// Open a database with a custom catalog.
    pub fn open_with_catalog(config: &Config, catalog: Catalog) -> Result<Self, Error> {
        info!(
            data_dir = %config.data_dir.display(),
            mode = ?config.storage.mode,
            tables = catalog.len(),
            "Opening database"
        );

        let sources = config.dataset_sources(&catalog);
        let engine = Engine::open(&config.storage, catalog, &sources)?;
        Ok(Self { engine })
    }

    /// Get a reference to the catalog.
    pub fn catalog(&self) -> &Catalog {
        self.engine.catalog()
    }

    /// Get a reference to the engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn builder(&self, table: &str) -> Result<QueryPlanBuilder<'_>, Error> {
        Ok(QueryPlanBuilder::for_table(self.engine.catalog(), table)?)
    }

    fn gateway(&self) -> ExecutionGateway<'_> {
        ExecutionGateway::new(&self.engine)
    }

    /// Filtered search over one table.
    pub fn search(
        &self,
        table: &str,
        filters: &FilterSpec,
        options: &SearchOptions,
    ) -> Result<Vec<Record>, Error> {
        let plan = self.builder(table)?.search(
            filters,
            options.fields.as_deref(),
            options.limit,
            options.offset,
        )?;
        Ok(self.gateway().execute(&plan)?)
    }

    /// Search using typed criteria.
    pub fn search_with<C: Criteria>(
        &self,
        criteria: &C,
        options: &SearchOptions,
    ) -> Result<Vec<Record>, Error> {
        self.search(C::TABLE, &criteria.to_filters(), options)
    }

    /// Fetch one record by id or, failing that, by display name.
    ///
    /// The id wins when both are given. Values are trimmed; blank values
    /// count as absent.
    pub fn get(&self, table: &str, id: Option<&str>, name: Option<&str>) -> Result<Record, Error> {
        let builder = self.builder(table)?;
        let subject = Subject::of(table);

        let id = id.map(str::trim).filter(|v| !v.is_empty());
        let name = name.map(str::trim).filter(|v| !v.is_empty());
        let (key, value) = match (id, name) {
            (Some(id), _) => (LookupKey::Id, id),
            (None, Some(name)) => (LookupKey::Name, name),
            (None, None) => {
                return Err(Error::missing(
                    "Either 'id' or 'name' must be provided",
                    subject.search_hint(),
                ))
            }
        };

        let plan = builder.get_by_key(key, value);
        debug!(table, lookup = key.as_str(), value, "Get record");

        ResultShaper::first(self.gateway().execute(&plan)?).ok_or_else(|| {
            Error::not_found(
                format!("No {} found with {} '{value}'", subject.noun, key.as_str()),
                subject.search_hint(),
            )
        })
    }

    /// Fetch several records and keep only the requested metrics.
    ///
    /// Ids win over names. Empty `metrics` means the category defaults, or
    /// every field for tables outside the test categories. Metrics a record
    /// lacks are left out of that record.
    pub fn compare(
        &self,
        table: &str,
        ids: &[String],
        names: &[String],
        metrics: &[String],
    ) -> Result<Vec<Record>, Error> {
        let builder = self.builder(table)?;
        let plan = match (ids.is_empty(), names.is_empty()) {
            (false, _) => builder.get_by_keys(LookupKey::Id, ids)?,
            (true, false) => builder.get_by_keys(LookupKey::Name, names)?,
            (true, true) => {
                return Err(Error::missing(
                    "Either 'ids' or 'names' must be provided",
                    COMPARE_HINT,
                ))
            }
        };
        debug!(table, ids = ids.len(), names = names.len(), "Compare records");

        let records = self.gateway().execute(&plan)?;
        if !metrics.is_empty() {
            return Ok(ResultShaper::project(records, metrics));
        }
        Ok(match Category::from_table(table) {
            Some(category) => ResultShaper::project(records, category.default_metrics()),
            None => records,
        })
    }

    /// Count a category's tests, optionally grouped by one allowed field.
    pub fn count(
        &self,
        category: Category,
        group_by: Option<&str>,
        filters: &FilterSpec,
    ) -> Result<CountSummary, Error> {
        let group_by = group_by.map(str::trim).filter(|g| !g.is_empty());
        let allowed = category.group_by_fields();
        if let Some(field) = group_by {
            if !allowed.contains(&field) {
                return Err(Error::invalid(
                    format!("Invalid group_by field '{field}' for {} tests", category.label()),
                    format!("Valid group_by options: {}", allowed.join(", ")),
                ));
            }
        }

        let builder = self.builder(category.table())?;
        let total = self.gateway().execute_count(&builder.count(filters)?)?;

        let Some(field) = group_by else {
            return Ok(CountSummary::total(total));
        };

        debug!(category = %category, group_by = field, "Grouped count");
        let rows = self
            .gateway()
            .execute(&builder.grouped_count(filters, field)?)?;
        Ok(CountSummary::grouped(
            total,
            field,
            ResultShaper::group_counts(&rows, field),
        ))
    }

    /// Sorted distinct vendors for one category, or across all of them.
    pub fn list_vendors(&self, category: Option<Category>) -> Result<Vec<String>, Error> {
        self.list_distinct(category, |_| "vendor")
    }

    /// Sorted distinct cancer types for one category, or across all of them.
    pub fn list_cancer_types(&self, category: Option<Category>) -> Result<Vec<String>, Error> {
        self.list_distinct(category, |c| c.cancer_type_field())
    }

    fn list_distinct(
        &self,
        category: Option<Category>,
        field: impl Fn(Category) -> &'static str,
    ) -> Result<Vec<String>, Error> {
        let categories = match category {
            Some(category) => vec![category],
            None => Category::ALL.to_vec(),
        };

        let mut results = Vec::with_capacity(categories.len());
        for category in categories {
            let plan = self.builder(category.table())?.distinct(field(category))?;
            results.push(self.gateway().execute(&plan)?);
        }
        Ok(ResultShaper::merge_distinct(results.iter().map(Vec::as_slice)))
    }

    /// Metadata and live test count for every category.
    pub fn list_categories(&self) -> Result<Vec<CategoryInfo>, Error> {
        Category::ALL
            .into_iter()
            .map(|category| {
                let count = self.table_row_count(category.table())?;
                Ok::<_, Error>(CategoryInfo::new(category, count))
            })
            .collect()
    }

    /// Number of rows in a table.
    pub fn table_row_count(&self, table: &str) -> Result<u64, Error> {
        let plan = self.builder(table)?.row_count();
        Ok(self.gateway().execute_count(&plan)?)
    }

    /// Check that the engine still answers queries.
    pub fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    /// Release the engine and any temporary files.
    pub fn close(self) {
        info!("Closing database");
        self.engine.close();
    }
}

/// How records of a table are named in messages.
struct Subject {
    noun: String,
    plural: &'static str,
    table: String,
}

impl Subject {
    fn of(table: &str) -> Self {
        let (noun, plural) = match Category::from_table(table) {
            Some(category) => (format!("{} test", category.label()), "tests"),
            None if table == "pap_programs" => ("PAP program".to_string(), "programs"),
            None => (format!("{table} record"), "records"),
        };
        Self {
            noun,
            plural,
            table: table.to_string(),
        }
    }

    fn search_hint(&self) -> String {
        format!("Search {} to find available {}", self.table, self.plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_wording() {
        let mrd = Subject::of("mrd_tests");
        assert_eq!(mrd.noun, "MRD test");
        assert_eq!(mrd.search_hint(), "Search mrd_tests to find available tests");

        let pap = Subject::of("pap_programs");
        assert_eq!(pap.noun, "PAP program");
        assert_eq!(pap.search_hint(), "Search pap_programs to find available programs");
    }
}
