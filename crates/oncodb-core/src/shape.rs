//! Result shaping.
//!
//! Turns gateway records into the forms callers return: projected
//! comparison rows, a single looked-up record, grouped counts, and sorted
//! distinct value lists.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::value::{FieldValue, Record};

/// Number of records in one group of a grouped count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    /// Group value; a null group is shown as `"null"`.
    pub value: String,
    /// Records in the group.
    pub count: u64,
}

/// Total count plus an optional per-group breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountSummary {
    /// Records matching the filters.
    pub total: u64,
    /// Field the groups are keyed by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Groups, largest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupCount>,
}

impl CountSummary {
    /// A summary without groups.
    pub fn total(total: u64) -> Self {
        Self {
            total,
            group_by: None,
            groups: Vec::new(),
        }
    }

    /// A summary with groups.
    pub fn grouped(total: u64, group_by: impl Into<String>, groups: Vec<GroupCount>) -> Self {
        Self {
            total,
            group_by: Some(group_by.into()),
            groups,
        }
    }
}

/// Stateless helpers over gateway output.
pub struct ResultShaper;

impl ResultShaper {
    /// Keep only `fields` in each record, in that order.
    pub fn project<S: AsRef<str>>(records: Vec<Record>, fields: &[S]) -> Vec<Record> {
        records.iter().map(|r| r.project(fields)).collect()
    }

    /// The first record, if any.
    pub fn first(records: Vec<Record>) -> Option<Record> {
        records.into_iter().next()
    }

    /// Read `(group, count)` rows produced by a grouped-count plan.
    pub fn group_counts(records: &[Record], field: &str) -> Vec<GroupCount> {
        records
            .iter()
            .map(|record| GroupCount {
                value: record
                    .get(field)
                    .map_or_else(|| "null".to_string(), ToString::to_string),
                count: record
                    .get("count")
                    .and_then(FieldValue::as_i64)
                    .map_or(0, |c| c.max(0) as u64),
            })
            .collect()
    }

    /// Sorted, deduplicated non-null values from the first column of each
    /// record of a distinct plan.
    pub fn distinct_values(records: &[Record]) -> Vec<String> {
        Self::merge_distinct([records])
    }

    /// Union of several distinct-value results, sorted.
    pub fn merge_distinct<'r, I>(results: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'r [Record]>,
    {
        let mut values = BTreeSet::new();
        for records in results {
            for record in records {
                if let Some((_, value)) = record.iter().next() {
                    if !value.is_null() {
                        values.insert(value.to_string());
                    }
                }
            }
        }
        values.into_iter().collect()
    }
}
