//! Statement assembly.
//!
//! Every table and field name reaching statement text has passed the catalog
//! allow-list or the identifier grammar; every caller value is a parameter.

use crate::catalog::{validate_field, Catalog, TableDef};
use crate::error::Error;
use crate::storage::{fold_case, FOLD_CASE};

use super::filter::{FilterSpec, FilterTranslator};
use super::plan::{QueryParam, QueryPlan};

/// Result count when none (or a non-positive one) is requested.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest result count a search may return.
pub const MAX_LIMIT: i64 = 500;

/// Which field a key lookup matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    /// The identity field, matched exactly.
    Id,
    /// The display-name field, matched exactly but case-insensitively
    /// (Unicode case folding).
    Name,
}

impl LookupKey {
    /// Lookup kind as shown to callers.
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKey::Id => "id",
            LookupKey::Name => "name",
        }
    }
}

/// Clamp a requested limit into `1..=MAX_LIMIT`, defaulting when absent.
pub fn effective_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(limit) if limit > 0 => limit.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

fn key_param(key: LookupKey, value: &str) -> QueryParam {
    match key {
        LookupKey::Id => QueryParam::Text(value.to_string()),
        LookupKey::Name => QueryParam::Text(fold_case(value)),
    }
}

/// Builds plans against one allow-listed table.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanBuilder<'a> {
    table: &'a TableDef,
}

impl<'a> QueryPlanBuilder<'a> {
    /// Create a builder for an already resolved table.
    pub fn new(table: &'a TableDef) -> Self {
        Self { table }
    }

    /// Resolve `name` against the catalog and create a builder for it.
    pub fn for_table(catalog: &'a Catalog, name: &str) -> Result<Self, Error> {
        catalog.table(name).map(Self::new)
    }

    /// The table this builder targets.
    pub fn table(&self) -> &'a TableDef {
        self.table
    }

    /// Filtered, projected, paginated select ordered by identity.
    pub fn search<S: AsRef<str>>(
        &self,
        filters: &FilterSpec,
        fields: Option<&[S]>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<QueryPlan, Error> {
        let projection = match fields {
            Some(fields) if !fields.is_empty() => fields
                .iter()
                .map(|f| validate_field(f.as_ref()))
                .collect::<Result<Vec<_>, _>>()?
                .join(", "),
            _ => "*".to_string(),
        };
        let (where_sql, params) = self.where_clause(filters)?;

        let mut sql = format!(
            "SELECT {projection} FROM {}{where_sql} ORDER BY {} LIMIT {}",
            self.table.name,
            self.table.identity_field,
            effective_limit(limit)
        );
        if let Some(offset) = offset.filter(|o| *o > 0) {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        Ok(self.plan(sql, params))
    }

    /// Single-key lookup.
    pub fn get_by_key(&self, key: LookupKey, value: &str) -> QueryPlan {
        let sql = format!(
            "SELECT * FROM {} WHERE {} ORDER BY {}",
            self.table.name,
            self.key_condition(key),
            self.table.identity_field
        );
        self.plan(sql, vec![key_param(key, value)])
    }

    /// Multi-key lookup; one parameter per value, in the given order.
    pub fn get_by_keys<S: AsRef<str>>(&self, key: LookupKey, values: &[S]) -> Result<QueryPlan, Error> {
        if values.is_empty() {
            return Err(Error::validation(format!(
                "{} list cannot be empty",
                match key {
                    LookupKey::Id => "ids",
                    LookupKey::Name => "names",
                }
            )));
        }

        let condition = match key {
            LookupKey::Id => format!(
                "{} IN ({})",
                self.table.identity_field,
                vec!["?"; values.len()].join(", ")
            ),
            LookupKey::Name => vec![self.key_condition(key); values.len()].join(" OR "),
        };
        let params = values.iter().map(|v| key_param(key, v.as_ref())).collect();

        let sql = format!(
            "SELECT * FROM {} WHERE {condition} ORDER BY {}",
            self.table.name, self.table.identity_field
        );
        Ok(self.plan(sql, params))
    }

    /// Filtered row count.
    pub fn count(&self, filters: &FilterSpec) -> Result<QueryPlan, Error> {
        let (where_sql, params) = self.where_clause(filters)?;
        let sql = format!("SELECT COUNT(*) FROM {}{where_sql}", self.table.name);
        Ok(self.plan(sql, params))
    }

    /// Filtered row count per distinct value of `group_by`, largest first.
    ///
    /// Result columns are `group_by` and `count`.
    pub fn grouped_count(&self, filters: &FilterSpec, group_by: &str) -> Result<QueryPlan, Error> {
        let field = validate_field(group_by)?;
        let (where_sql, params) = self.where_clause(filters)?;
        let sql = format!(
            "SELECT {field}, COUNT(*) AS count FROM {}{where_sql} GROUP BY {field} ORDER BY count DESC, {field}",
            self.table.name
        );
        Ok(self.plan(sql, params))
    }

    /// Sorted distinct non-null values of a field.
    ///
    /// Array fields are flattened first and yield a single `value` column;
    /// scalar fields yield a column named after the field.
    pub fn distinct(&self, field: &str) -> Result<QueryPlan, Error> {
        let field = validate_field(field)?;
        let table = &self.table.name;
        let sql = if self.table.is_array_field(field) {
            format!(
                "SELECT DISTINCT json_each.value AS value FROM {table}, json_each({table}.{field}) \
                 WHERE json_each.value IS NOT NULL ORDER BY value"
            )
        } else {
            format!("SELECT DISTINCT {field} FROM {table} WHERE {field} IS NOT NULL ORDER BY {field}")
        };
        Ok(self.plan(sql, Vec::new()))
    }

    /// Unfiltered row count.
    pub fn row_count(&self) -> QueryPlan {
        self.plan(format!("SELECT COUNT(*) FROM {}", self.table.name), Vec::new())
    }

    fn key_condition(&self, key: LookupKey) -> String {
        match key {
            LookupKey::Id => format!("{} = ?", self.table.identity_field),
            LookupKey::Name => format!("{FOLD_CASE}({}) = ?", self.table.name_field),
        }
    }

    fn where_clause(&self, filters: &FilterSpec) -> Result<(String, Vec<QueryParam>), Error> {
        let conditions = FilterTranslator::new(self.table).translate_all(filters)?;
        if conditions.is_empty() {
            return Ok((String::new(), Vec::new()));
        }

        let mut fragments = Vec::with_capacity(conditions.len());
        let mut params = Vec::with_capacity(conditions.len());
        for condition in conditions {
            fragments.push(condition.fragment);
            params.extend(condition.param);
        }
        Ok((format!(" WHERE {}", fragments.join(" AND ")), params))
    }

    fn plan(&self, sql: String, params: Vec<QueryParam>) -> QueryPlan {
        QueryPlan::new(self.table.name.as_str(), sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterValue;
    use pretty_assertions::assert_eq;

    const NO_FIELDS: Option<&[&str]> = None;

    fn catalog() -> Catalog {
        Catalog::standard()
    }

    #[test]
    fn test_search_basic() {
        let catalog = catalog();
        let builder = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let plan = builder
            .search(&FilterSpec::new(), NO_FIELDS, Some(10), None)
            .unwrap();
        assert_eq!(plan.sql(), "SELECT * FROM mrd_tests ORDER BY id LIMIT 10");
        assert!(plan.params().is_empty());
    }

    #[test]
    fn test_search_with_filters_and_projection() {
        let catalog = catalog();
        let builder = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let filters = FilterSpec::new()
            .with("vendor", "Quest")
            .with("min_sensitivity", 90.0);
        let plan = builder
            .search(
                &filters,
                Some(&["id", "name", "vendor", "sensitivity"][..]),
                Some(10),
                Some(20),
            )
            .unwrap();
        assert_eq!(
            plan.sql(),
            "SELECT id, name, vendor, sensitivity FROM mrd_tests \
             WHERE fold_case(vendor) LIKE ? \
             AND (sensitivity >= ? AND typeof(sensitivity) IN ('integer', 'real')) \
             ORDER BY id LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            plan.params(),
            &[QueryParam::Text("%quest%".into()), QueryParam::Float(90.0)]
        );
    }

    #[test]
    fn test_search_without_surviving_conditions_has_no_where() {
        let catalog = catalog();
        let builder = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let filters = FilterSpec::new()
            .with("exclude_discontinued", false)
            .with("vendor", FilterValue::Null);
        let plan = builder.search(&filters, NO_FIELDS, None, Some(0)).unwrap();
        assert_eq!(plan.sql(), "SELECT * FROM mrd_tests ORDER BY id LIMIT 50");
    }

    #[test]
    fn test_limit_clamping() {
        assert_eq!(effective_limit(Some(1000)), 500);
        assert_eq!(effective_limit(Some(500)), 500);
        assert_eq!(effective_limit(Some(0)), 50);
        assert_eq!(effective_limit(Some(-3)), 50);
        assert_eq!(effective_limit(None), 50);
        assert_eq!(effective_limit(Some(7)), 7);
    }

    #[test]
    fn test_invalid_projection_field() {
        let catalog = catalog();
        let builder = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let err = builder
            .search(&FilterSpec::new(), Some(&["id", "name; DROP TABLE x"][..]), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_unknown_table() {
        let catalog = catalog();
        assert!(QueryPlanBuilder::for_table(&catalog, "invalid_table").is_err());
        assert!(QueryPlanBuilder::for_table(&catalog, "mrd_tests; drop table x;--").is_err());
    }

    #[test]
    fn test_get_by_key() {
        let catalog = catalog();
        let mrd = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let plan = mrd.get_by_key(LookupKey::Id, "mrd-1");
        assert_eq!(plan.sql(), "SELECT * FROM mrd_tests WHERE id = ? ORDER BY id");
        assert_eq!(plan.params(), &[QueryParam::Text("mrd-1".into())]);

        let ecd = QueryPlanBuilder::for_table(&catalog, "ecd_tests").unwrap();
        let plan = ecd.get_by_key(LookupKey::Name, "Shield");
        assert_eq!(
            plan.sql(),
            "SELECT * FROM ecd_tests WHERE fold_case(name) = ? ORDER BY id"
        );
        assert_eq!(plan.params(), &[QueryParam::Text("shield".into())]);

        let pap = QueryPlanBuilder::for_table(&catalog, "pap_programs").unwrap();
        let plan = pap.get_by_key(LookupKey::Name, "Natera");
        assert!(plan.sql().contains("fold_case(vendorName) = ?"));
    }

    #[test]
    fn test_get_by_keys() {
        let catalog = catalog();
        let mrd = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let plan = mrd
            .get_by_keys(LookupKey::Id, &["mrd-1", "mrd-2", "mrd-3"])
            .unwrap();
        assert_eq!(
            plan.sql(),
            "SELECT * FROM mrd_tests WHERE id IN (?, ?, ?) ORDER BY id"
        );
        assert_eq!(plan.params().len(), 3);

        let tds = QueryPlanBuilder::for_table(&catalog, "tds_tests").unwrap();
        let plan = tds
            .get_by_keys(LookupKey::Name, &["FoundationOne CDx", "Tempus xT"])
            .unwrap();
        assert_eq!(
            plan.sql(),
            "SELECT * FROM tds_tests WHERE fold_case(name) = ? OR fold_case(name) = ? ORDER BY id"
        );
        assert_eq!(
            plan.params(),
            &[
                QueryParam::Text("foundationone cdx".into()),
                QueryParam::Text("tempus xt".into())
            ]
        );
    }

    #[test]
    fn test_get_by_keys_empty() {
        let catalog = catalog();
        let mrd = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let empty: [&str; 0] = [];
        assert!(matches!(
            mrd.get_by_keys(LookupKey::Id, &empty),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            mrd.get_by_keys(LookupKey::Name, &empty),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_count() {
        let catalog = catalog();
        let mrd = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let plan = mrd.count(&FilterSpec::new()).unwrap();
        assert_eq!(plan.sql(), "SELECT COUNT(*) FROM mrd_tests");

        let plan = mrd
            .count(&FilterSpec::new().with("vendor", "Natera"))
            .unwrap();
        assert_eq!(plan.sql(), "SELECT COUNT(*) FROM mrd_tests WHERE fold_case(vendor) LIKE ?");
        assert_eq!(plan.params(), &[QueryParam::Text("%natera%".into())]);
    }

    #[test]
    fn test_grouped_count() {
        let catalog = catalog();
        let mrd = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let plan = mrd
            .grouped_count(&FilterSpec::new().with("approach", "Tumor"), "vendor")
            .unwrap();
        assert_eq!(
            plan.sql(),
            "SELECT vendor, COUNT(*) AS count FROM mrd_tests WHERE fold_case(approach) LIKE ? GROUP BY vendor ORDER BY count DESC, vendor"
        );
        assert!(mrd.grouped_count(&FilterSpec::new(), "vendor--").is_err());
    }

    #[test]
    fn test_distinct() {
        let catalog = catalog();
        let mrd = QueryPlanBuilder::for_table(&catalog, "mrd_tests").unwrap();
        let plan = mrd.distinct("vendor").unwrap();
        assert_eq!(
            plan.sql(),
            "SELECT DISTINCT vendor FROM mrd_tests WHERE vendor IS NOT NULL ORDER BY vendor"
        );

        let plan = mrd.distinct("cancerTypes").unwrap();
        assert!(plan.sql().contains("json_each(mrd_tests.cancerTypes)"));
        assert!(plan.sql().contains("AS value"));
        assert!(plan.params().is_empty());

        assert!(mrd.distinct("vendor; DROP TABLE mrd_tests").is_err());
    }

    #[test]
    fn test_placeholders_match_params() {
        let catalog = catalog();
        let hct = QueryPlanBuilder::for_table(&catalog, "hct_tests").unwrap();
        let filters = FilterSpec::new()
            .with("vendor", "Myriad")
            .with("cancerTypesAssessed", "Breast")
            .with("has_fda_cdx", true)
            .with("max_listPrice", 250)
            .with("medicareCovered", true);
        let plan = hct.search(&filters, NO_FIELDS, Some(5), None).unwrap();
        assert_eq!(plan.placeholder_count(), plan.params().len());
        assert_eq!(plan.params().len(), 4);
    }
}
