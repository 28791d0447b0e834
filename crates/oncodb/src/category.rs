//! Diagnostic test categories.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// A diagnostic test category and the table that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Molecular residual disease.
    Mrd,
    /// Early cancer detection.
    Ecd,
    /// Hereditary cancer testing.
    Hct,
    /// Treatment decision support.
    Tds,
}

impl Category {
    /// Every category, in listing order.
    pub const ALL: [Category; 4] = [Category::Mrd, Category::Ecd, Category::Hct, Category::Tds];

    /// Lowercase identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Category::Mrd => "mrd",
            Category::Ecd => "ecd",
            Category::Hct => "hct",
            Category::Tds => "tds",
        }
    }

    /// Backing table.
    pub fn table(&self) -> &'static str {
        match self {
            Category::Mrd => "mrd_tests",
            Category::Ecd => "ecd_tests",
            Category::Hct => "hct_tests",
            Category::Tds => "tds_tests",
        }
    }

    /// Full display name.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Mrd => "Molecular Residual Disease",
            Category::Ecd => "Early Cancer Detection",
            Category::Hct => "Hereditary Cancer Testing",
            Category::Tds => "Treatment Decision Support",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Category::Mrd => "MRD Testing",
            Category::Ecd => "ECD Testing",
            Category::Hct => "HCT Testing",
            Category::Tds => "TDS Testing",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Mrd => {
                "Detect residual cancer after treatment via circulating tumor DNA (ctDNA)"
            }
            Category::Ecd => "Screen for cancer in asymptomatic individuals",
            Category::Hct => "Identify inherited genetic mutations that increase cancer risk",
            Category::Tds => "Guide treatment decisions via comprehensive genomic profiling",
        }
    }

    /// Metrics shown by a comparison when none are requested.
    pub fn default_metrics(&self) -> &'static [&'static str] {
        match self {
            Category::Mrd => &[
                "name",
                "vendor",
                "sensitivity",
                "specificity",
                "lod",
                "initialTat",
                "followUpTat",
                "fdaStatus",
                "reimbursement",
            ],
            Category::Ecd => &[
                "name",
                "vendor",
                "testScope",
                "sensitivity",
                "specificity",
                "stageISensitivity",
                "ppv",
                "npv",
                "listPrice",
                "fdaStatus",
            ],
            Category::Hct => &[
                "name",
                "vendor",
                "genesAnalyzed",
                "cancerTypesAssessed",
                "sampleCategory",
                "tat",
                "listPrice",
                "fdaStatus",
            ],
            Category::Tds => &[
                "name",
                "vendor",
                "productType",
                "genesAnalyzed",
                "fdaCompanionDxCount",
                "tat",
                "listPrice",
                "fdaStatus",
            ],
        }
    }

    /// Fields a count may be grouped by, sorted.
    pub fn group_by_fields(&self) -> &'static [&'static str] {
        match self {
            Category::Mrd => &["approach", "fdaStatus", "reimbursement", "requiresTumorTissue", "vendor"],
            Category::Ecd => &["fdaStatus", "reimbursement", "testScope", "vendor"],
            Category::Hct => &["fdaStatus", "reimbursement", "sampleCategory", "vendor"],
            Category::Tds => &["approach", "fdaStatus", "productType", "reimbursement", "vendor"],
        }
    }

    /// Array field listing the cancer types a test covers.
    pub fn cancer_type_field(&self) -> &'static str {
        match self {
            Category::Hct => "cancerTypesAssessed",
            _ => "cancerTypes",
        }
    }

    /// Category backed by `table`, if any.
    pub fn from_table(table: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.table() == table)
    }

    /// Parse an optional category argument; blank means "all categories".
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Category>, Error> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(id) => id.parse().map(Some),
        }
    }

    /// Upper-case label used in messages, such as `MRD`.
    pub(crate) fn label(&self) -> String {
        self.id().to_ascii_uppercase()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(Category::id).collect();
                Error::invalid(
                    format!("Invalid category '{s}'"),
                    format!("Valid categories: {}", valid.join(", ")),
                )
            })
    }
}

/// Category metadata with its live test count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub short_name: &'static str,
    pub description: &'static str,
    pub test_count: u64,
}

impl CategoryInfo {
    pub(crate) fn new(category: Category, test_count: u64) -> Self {
        Self {
            id: category.id(),
            name: category.name(),
            short_name: category.short_name(),
            description: category.description(),
            test_count,
        }
    }
}
