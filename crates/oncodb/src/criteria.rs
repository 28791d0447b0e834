//! Typed search and count criteria per category.
//!
//! Each criteria struct names the filters its category supports and turns
//! the supplied ones into a [`FilterSpec`]. Unset fields add nothing.

use oncodb_core::query::{FilterSpec, FilterValue};

/// Comma-separated caller input split into trimmed, non-empty items.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Like [`parse_list`], but absent or blank input yields `None`.
pub fn parse_optional_list(value: Option<&str>) -> Option<Vec<String>> {
    value
        .map(parse_list)
        .filter(|items| !items.is_empty())
}

/// Projection and paging for a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Fields to return; `None` returns every field.
    pub fields: Option<Vec<String>>,
    /// Maximum records to return.
    pub limit: Option<i64>,
    /// Records to skip.
    pub offset: Option<i64>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return only `fields`.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Filters for one table, built from typed fields.
pub trait Criteria {
    /// Table the filters apply to.
    const TABLE: &'static str;

    /// The supplied fields as a filter map, in declaration order.
    fn to_filters(&self) -> FilterSpec;
}

fn put(filters: &mut FilterSpec, key: &str, value: Option<impl Into<FilterValue>>) {
    if let Some(value) = value {
        filters.insert(key, value);
    }
}

/// Molecular residual disease search filters.
#[derive(Debug, Clone, Default)]
pub struct MrdCriteria {
    pub vendor: Option<String>,
    pub cancer_type: Option<String>,
    pub approach: Option<String>,
    pub fda_status: Option<String>,
    pub min_sensitivity: Option<f64>,
    /// Stored as "Yes"/"No" in the dataset.
    pub requires_tumor_tissue: Option<bool>,
    pub clinical_setting: Option<String>,
}

impl Criteria for MrdCriteria {
    const TABLE: &'static str = "mrd_tests";

    fn to_filters(&self) -> FilterSpec {
        let mut filters = FilterSpec::new();
        put(&mut filters, "vendor", self.vendor.clone());
        put(&mut filters, "cancerTypes", self.cancer_type.clone());
        put(&mut filters, "approach", self.approach.clone());
        put(&mut filters, "fdaStatus", self.fda_status.clone());
        put(&mut filters, "min_sensitivity", self.min_sensitivity);
        put(
            &mut filters,
            "requiresTumorTissue",
            self.requires_tumor_tissue.map(|b| if b { "Yes" } else { "No" }),
        );
        put(&mut filters, "clinicalSettings", self.clinical_setting.clone());
        filters
    }
}

/// Early cancer detection search filters.
#[derive(Debug, Clone, Default)]
pub struct EcdCriteria {
    pub vendor: Option<String>,
    pub cancer_type: Option<String>,
    pub test_scope: Option<String>,
    pub fda_status: Option<String>,
    pub min_sensitivity: Option<f64>,
    pub min_specificity: Option<f64>,
    pub max_price: Option<f64>,
}

impl Criteria for EcdCriteria {
    const TABLE: &'static str = "ecd_tests";

    fn to_filters(&self) -> FilterSpec {
        let mut filters = FilterSpec::new();
        put(&mut filters, "vendor", self.vendor.clone());
        put(&mut filters, "cancerTypes", self.cancer_type.clone());
        put(&mut filters, "testScope", self.test_scope.clone());
        put(&mut filters, "fdaStatus", self.fda_status.clone());
        put(&mut filters, "min_sensitivity", self.min_sensitivity);
        put(&mut filters, "min_specificity", self.min_specificity);
        put(&mut filters, "max_listPrice", self.max_price);
        filters
    }
}

/// Hereditary cancer testing search filters.
#[derive(Debug, Clone, Default)]
pub struct HctCriteria {
    pub vendor: Option<String>,
    /// Matched against `cancerTypesAssessed`.
    pub cancer_type: Option<String>,
    pub fda_status: Option<String>,
    pub min_genes: Option<i64>,
}

impl Criteria for HctCriteria {
    const TABLE: &'static str = "hct_tests";

    fn to_filters(&self) -> FilterSpec {
        let mut filters = FilterSpec::new();
        put(&mut filters, "vendor", self.vendor.clone());
        put(&mut filters, "cancerTypesAssessed", self.cancer_type.clone());
        put(&mut filters, "fdaStatus", self.fda_status.clone());
        put(&mut filters, "min_genesAnalyzed", self.min_genes);
        filters
    }
}

/// Treatment decision support search filters.
#[derive(Debug, Clone, Default)]
pub struct TdsCriteria {
    pub vendor: Option<String>,
    pub cancer_type: Option<String>,
    pub product_type: Option<String>,
    pub sample_category: Option<String>,
    pub approach: Option<String>,
    pub fda_status: Option<String>,
    pub min_genes: Option<i64>,
    pub has_fda_cdx: Option<bool>,
}

impl Criteria for TdsCriteria {
    const TABLE: &'static str = "tds_tests";

    fn to_filters(&self) -> FilterSpec {
        let mut filters = FilterSpec::new();
        put(&mut filters, "vendor", self.vendor.clone());
        put(&mut filters, "cancerTypes", self.cancer_type.clone());
        put(&mut filters, "productType", self.product_type.clone());
        put(&mut filters, "sampleCategory", self.sample_category.clone());
        put(&mut filters, "approach", self.approach.clone());
        put(&mut filters, "fdaStatus", self.fda_status.clone());
        put(&mut filters, "min_genesAnalyzed", self.min_genes);
        put(&mut filters, "has_fda_cdx", self.has_fda_cdx);
        filters
    }
}

/// Patient assistance program search filters.
#[derive(Debug, Clone, Default)]
pub struct PapCriteria {
    /// Matched against `vendorName`.
    pub vendor: Option<String>,
    pub medicare: Option<bool>,
    pub medicaid: Option<bool>,
}

impl Criteria for PapCriteria {
    const TABLE: &'static str = "pap_programs";

    fn to_filters(&self) -> FilterSpec {
        let mut filters = FilterSpec::new();
        put(&mut filters, "vendorName", self.vendor.clone());
        put(&mut filters, "medicareEligible", self.medicare);
        put(&mut filters, "medicaidEligible", self.medicaid);
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(filters: &FilterSpec) -> Vec<&str> {
        filters.iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" mrd-1, ,mrd-2 ,, "), vec!["mrd-1", "mrd-2"]);
        assert!(parse_list("").is_empty());
        assert_eq!(parse_optional_list(Some(" , ")), None);
        assert_eq!(parse_optional_list(None), None);
        assert_eq!(
            parse_optional_list(Some("id,name")),
            Some(vec!["id".to_string(), "name".to_string()])
        );
    }

    #[test]
    fn test_mrd_criteria() {
        let criteria = MrdCriteria {
            vendor: Some("Natera".into()),
            min_sensitivity: Some(90.0),
            requires_tumor_tissue: Some(false),
            ..Default::default()
        };
        let filters = criteria.to_filters();

        assert_eq!(keys(&filters), vec!["vendor", "min_sensitivity", "requiresTumorTissue"]);
        assert_eq!(filters.get("requiresTumorTissue"), Some(&FilterValue::from("No")));
        assert_eq!(filters.get("min_sensitivity"), Some(&FilterValue::Float(90.0)));
    }

    #[test]
    fn test_hct_uses_assessed_cancer_types() {
        let filters = HctCriteria {
            cancer_type: Some("Lynch".into()),
            min_genes: Some(30),
            ..Default::default()
        }
        .to_filters();

        assert_eq!(keys(&filters), vec!["cancerTypesAssessed", "min_genesAnalyzed"]);
    }

    #[test]
    fn test_tds_and_pap_criteria() {
        let filters = TdsCriteria {
            has_fda_cdx: Some(true),
            ..Default::default()
        }
        .to_filters();
        assert_eq!(filters.get("has_fda_cdx"), Some(&FilterValue::Bool(true)));

        let filters = PapCriteria {
            vendor: Some("Natera".into()),
            medicaid: Some(true),
            ..Default::default()
        }
        .to_filters();
        assert_eq!(keys(&filters), vec!["vendorName", "medicaidEligible"]);
    }

    #[test]
    fn test_empty_criteria_add_nothing() {
        assert!(EcdCriteria::default().to_filters().is_empty());
        assert!(TdsCriteria::default().to_filters().is_empty());
    }

    #[test]
    fn test_search_options_builder() {
        let options = SearchOptions::new()
            .with_fields(["id", "name"])
            .with_limit(10)
            .with_offset(20);
        assert_eq!(options.fields, Some(vec!["id".to_string(), "name".to_string()]));
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.offset, Some(20));
    }
}
