//! Filter translation.
//!
//! A filter map is a sparse `key -> value` mapping where the key encodes the
//! semantics: `min_`/`max_` prefixes are range bounds, array fields are
//! containment tests, reserved meta keys expand to fixed conditions, and
//! everything else is equality (booleans, numbers) or a partial,
//! case-insensitive match (strings). Range bounds only ever match numeric
//! values, so text in a column that also holds numbers never satisfies one.
//! Case folding is Unicode-aware through the engine's `fold_case` function.
//!
//! Translation is a single pass over [`RULES`]: the first rule whose pattern
//! matches the entry decides the [`FilterOp`].

use crate::catalog::{validate_field, TableDef};
use crate::error::Error;
use crate::storage::{fold_case, FOLD_CASE};

use super::plan::QueryParam;

/// A caller-supplied filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Null; the entry is skipped.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Text(String),
    /// Anything else (arrays, objects). No filter semantics.
    Other(serde_json::Value),
}

impl FilterValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    fn kind(&self) -> Option<ValueKind> {
        match self {
            FilterValue::Bool(_) => Some(ValueKind::Bool),
            FilterValue::Int(_) | FilterValue::Float(_) => Some(ValueKind::Number),
            FilterValue::Text(_) => Some(ValueKind::Text),
            FilterValue::Null | FilterValue::Other(_) => None,
        }
    }

    fn as_number(&self) -> Option<QueryParam> {
        match self {
            FilterValue::Int(i) => Some(QueryParam::Int(*i)),
            FilterValue::Float(f) => Some(QueryParam::Float(*f)),
            _ => None,
        }
    }

    /// Scalar rendered as text, as stored in array elements.
    fn as_element(&self) -> Option<String> {
        match self {
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::Bool(b) => Some(b.to_string()),
            FilterValue::Int(i) => Some(i.to_string()),
            FilterValue::Float(f) => Some(f.to_string()),
            FilterValue::Null | FilterValue::Other(_) => None,
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Int(i64::from(v))
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FilterValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => FilterValue::Null,
            serde_json::Value::Bool(b) => FilterValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FilterValue::Int(i),
                None => n.as_f64().map_or(FilterValue::Other(n.into()), FilterValue::Float),
            },
            serde_json::Value::String(s) => FilterValue::Text(s),
            other => FilterValue::Other(other),
        }
    }
}

/// An insertion-ordered filter map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    entries: Vec<(String, FilterValue)>,
}

impl FilterSpec {
    /// Create an empty filter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an entry. Re-inserting a key replaces its value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries, including null ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from a JSON object, keeping key order.
    pub fn from_json(value: serde_json::Value) -> Result<Self, Error> {
        match value {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            serde_json::Value::Null => Ok(Self::new()),
            other => Err(Error::validation(format!(
                "filters must be a JSON object, got: {other}"
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (key, value) in iter {
            spec.insert(key, value);
        }
        spec
    }
}

/// The resolved meaning of one filter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// `field = ?`
    Equals { field: String, value: QueryParam },
    /// Partial, case-insensitive match against a wildcard-wrapped pattern.
    Matches { field: String, pattern: String },
    /// `field >= ?`, numeric values only.
    RangeLower { field: String, bound: QueryParam },
    /// `field <= ?`, numeric values only.
    RangeUpper { field: String, bound: QueryParam },
    /// The array in `field` has an element equal to `element`.
    Contains { field: String, element: String },
    /// A fixed condition with no parameter.
    Literal(&'static str),
    /// No condition.
    Drop,
}

impl FilterOp {
    /// Render as a condition fragment and its parameter.
    pub fn into_condition(self) -> Option<Condition> {
        let (fragment, param) = match self {
            FilterOp::Equals { field, value } => (format!("{field} = ?"), Some(value)),
            FilterOp::Matches { field, pattern } => {
                (format!("{FOLD_CASE}({field}) LIKE ?"), Some(QueryParam::Text(pattern)))
            }
            FilterOp::RangeLower { field, bound } => (range_fragment(&field, ">="), Some(bound)),
            FilterOp::RangeUpper { field, bound } => (range_fragment(&field, "<="), Some(bound)),
            FilterOp::Contains { field, element } => (
                format!("EXISTS (SELECT 1 FROM json_each({field}) WHERE json_each.value = ?)"),
                Some(QueryParam::Text(element)),
            ),
            FilterOp::Literal(sql) => (sql.to_string(), None),
            FilterOp::Drop => return None,
        };
        Some(Condition { fragment, param })
    }
}

fn range_fragment(field: &str, op: &str) -> String {
    format!("({field} {op} ? AND typeof({field}) IN ('integer', 'real'))")
}

/// A condition fragment with at most one bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Statement fragment; contains one `?` iff `param` is set.
    pub fragment: String,
    /// Parameter for the fragment's placeholder.
    pub param: Option<QueryParam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Bool,
    Number,
    Text,
}

#[derive(Debug, Clone, Copy)]
enum KeyPattern {
    /// Reserved key, matched exactly.
    Meta(&'static str),
    /// Key prefix naming a field after it.
    Prefix(&'static str),
    /// Key is an array field of the table.
    ArrayField,
    /// Plain field key with a value of the given kind.
    Plain(ValueKind),
}

#[derive(Debug, Clone, Copy)]
enum Action {
    /// Fixed conditions for `true` and `false`; `None` drops the entry.
    Meta {
        when_true: Option<&'static str>,
        when_false: Option<&'static str>,
    },
    RangeLower,
    RangeUpper,
    Contains,
    Equals,
    Matches,
}

struct FilterRule {
    pattern: KeyPattern,
    action: Action,
}

/// Resolution order; the first matching rule wins.
const RULES: &[FilterRule] = &[
    FilterRule {
        pattern: KeyPattern::Meta("exclude_discontinued"),
        action: Action::Meta {
            when_true: Some("(isDiscontinued = FALSE OR isDiscontinued IS NULL)"),
            when_false: None,
        },
    },
    FilterRule {
        pattern: KeyPattern::Meta("has_fda_cdx"),
        action: Action::Meta {
            when_true: Some("fdaCompanionDxCount > 0"),
            when_false: Some("(fdaCompanionDxCount = 0 OR fdaCompanionDxCount IS NULL)"),
        },
    },
    FilterRule {
        pattern: KeyPattern::Prefix("min_"),
        action: Action::RangeLower,
    },
    FilterRule {
        pattern: KeyPattern::Prefix("max_"),
        action: Action::RangeUpper,
    },
    FilterRule {
        pattern: KeyPattern::ArrayField,
        action: Action::Contains,
    },
    FilterRule {
        pattern: KeyPattern::Plain(ValueKind::Bool),
        action: Action::Equals,
    },
    FilterRule {
        pattern: KeyPattern::Plain(ValueKind::Text),
        action: Action::Matches,
    },
    FilterRule {
        pattern: KeyPattern::Plain(ValueKind::Number),
        action: Action::Equals,
    },
];

/// Reserved filter keys that do not name a field.
pub fn meta_keys() -> impl Iterator<Item = &'static str> {
    RULES.iter().filter_map(|rule| match rule.pattern {
        KeyPattern::Meta(key) => Some(key),
        _ => None,
    })
}

/// Translates filter entries for one table.
pub struct FilterTranslator<'a> {
    table: &'a TableDef,
}

impl<'a> FilterTranslator<'a> {
    /// Create a translator for a table.
    pub fn new(table: &'a TableDef) -> Self {
        Self { table }
    }

    /// Resolve one entry to its operation.
    ///
    /// Fails if the key (or the field after a range prefix) is not a valid
    /// identifier, or a range bound is not numeric.
    pub fn resolve(&self, key: &str, value: &FilterValue) -> Result<FilterOp, Error> {
        if value.is_null() {
            return Ok(FilterOp::Drop);
        }

        for rule in RULES {
            let field = match rule.pattern {
                KeyPattern::Meta(name) => {
                    if key != name {
                        continue;
                    }
                    key
                }
                KeyPattern::Prefix(prefix) => match key.strip_prefix(prefix) {
                    Some(field) => {
                        validate_field(key)?;
                        validate_field(field)?
                    }
                    None => continue,
                },
                KeyPattern::ArrayField => {
                    if !self.table.is_array_field(key) {
                        continue;
                    }
                    validate_field(key)?
                }
                KeyPattern::Plain(kind) => {
                    validate_field(key)?;
                    if value.kind() != Some(kind) {
                        continue;
                    }
                    key
                }
            };
            return Self::apply(rule.action, key, field, value);
        }

        validate_field(key)?;
        Ok(FilterOp::Drop)
    }

    fn apply(action: Action, key: &str, field: &str, value: &FilterValue) -> Result<FilterOp, Error> {
        let field_name = || field.to_string();
        let op = match action {
            Action::Meta {
                when_true,
                when_false,
            } => {
                let literal = match value {
                    FilterValue::Bool(true) => when_true,
                    FilterValue::Bool(false) => when_false,
                    _ => None,
                };
                literal.map_or(FilterOp::Drop, FilterOp::Literal)
            }
            Action::RangeLower | Action::RangeUpper => {
                let bound = value.as_number().ok_or_else(|| {
                    Error::validation(format!("filter {key} requires a numeric value"))
                })?;
                match action {
                    Action::RangeLower => FilterOp::RangeLower {
                        field: field_name(),
                        bound,
                    },
                    _ => FilterOp::RangeUpper {
                        field: field_name(),
                        bound,
                    },
                }
            }
            Action::Contains => match value.as_element() {
                Some(element) => FilterOp::Contains {
                    field: field_name(),
                    element,
                },
                None => FilterOp::Drop,
            },
            Action::Equals => match value {
                FilterValue::Bool(b) => FilterOp::Equals {
                    field: field_name(),
                    value: QueryParam::Bool(*b),
                },
                _ => match value.as_number() {
                    Some(number) => FilterOp::Equals {
                        field: field_name(),
                        value: number,
                    },
                    None => FilterOp::Drop,
                },
            },
            Action::Matches => match value {
                FilterValue::Text(text) => FilterOp::Matches {
                    field: field_name(),
                    pattern: format!("%{}%", fold_case(text)),
                },
                _ => FilterOp::Drop,
            },
        };
        Ok(op)
    }

    /// Translate one entry into a condition, or `None` if it is dropped.
    pub fn translate(&self, key: &str, value: &FilterValue) -> Result<Option<Condition>, Error> {
        Ok(self.resolve(key, value)?.into_condition())
    }

    /// Translate every entry, in insertion order.
    pub fn translate_all(&self, filters: &FilterSpec) -> Result<Vec<Condition>, Error> {
        let mut conditions = Vec::with_capacity(filters.len());
        for (key, value) in filters.iter() {
            if let Some(condition) = self.translate(key, value)? {
                conditions.push(condition);
            }
        }
        Ok(conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn mrd() -> TableDef {
        Catalog::standard().table("mrd_tests").unwrap().clone()
    }

    fn translate(key: &str, value: impl Into<FilterValue>) -> Option<Condition> {
        let table = mrd();
        FilterTranslator::new(&table)
            .translate(key, &value.into())
            .unwrap()
    }

    #[test]
    fn test_string_is_partial_match() {
        let condition = translate("vendor", "Natera").unwrap();
        assert_eq!(condition.fragment, "fold_case(vendor) LIKE ?");
        assert_eq!(condition.param, Some(QueryParam::Text("%natera%".into())));
    }

    #[test]
    fn test_partial_match_folds_unicode_case() {
        let condition = translate("vendor", "GÖTTING").unwrap();
        assert_eq!(condition.param, Some(QueryParam::Text("%götting%".into())));
    }

    #[test]
    fn test_range_bounds() {
        let lower = translate("min_sensitivity", 90.0).unwrap();
        assert_eq!(
            lower.fragment,
            "(sensitivity >= ? AND typeof(sensitivity) IN ('integer', 'real'))"
        );
        assert_eq!(lower.param, Some(QueryParam::Float(90.0)));

        let upper = translate("max_listPrice", 1000).unwrap();
        assert_eq!(
            upper.fragment,
            "(listPrice <= ? AND typeof(listPrice) IN ('integer', 'real'))"
        );
        assert_eq!(upper.fragment.matches('?').count(), 1);
        assert_eq!(upper.param, Some(QueryParam::Int(1000)));
    }

    #[test]
    fn test_range_requires_number() {
        let table = mrd();
        let err = FilterTranslator::new(&table)
            .translate("min_sensitivity", &"high".into())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_range_field_validated() {
        let table = mrd();
        let translator = FilterTranslator::new(&table);
        assert!(translator.translate("min_", &1.into()).is_err());
        assert!(translator.translate("min_1abc", &1.into()).is_err());
        assert!(translator.translate("max_x;--", &1.into()).is_err());
    }

    #[test]
    fn test_array_field_is_containment() {
        let condition = translate("cancerTypes", "Colorectal").unwrap();
        assert_eq!(
            condition.fragment,
            "EXISTS (SELECT 1 FROM json_each(cancerTypes) WHERE json_each.value = ?)"
        );
        assert_eq!(condition.param, Some(QueryParam::Text("Colorectal".into())));
    }

    #[test]
    fn test_array_field_only_for_declared_fields() {
        let table = TableDef::new("items", "id");
        let condition = FilterTranslator::new(&table)
            .translate("cancerTypes", &"Colorectal".into())
            .unwrap()
            .unwrap();
        assert_eq!(condition.fragment, "fold_case(cancerTypes) LIKE ?");
    }

    #[test]
    fn test_bool_and_number_equality() {
        let flag = translate("requiresTumorTissue", true).unwrap();
        assert_eq!(flag.fragment, "requiresTumorTissue = ?");
        assert_eq!(flag.param, Some(QueryParam::Bool(true)));

        let number = translate("genesAnalyzed", 50).unwrap();
        assert_eq!(number.fragment, "genesAnalyzed = ?");
        assert_eq!(number.param, Some(QueryParam::Int(50)));
    }

    #[test]
    fn test_meta_keys() {
        let excluded = translate("exclude_discontinued", true).unwrap();
        assert_eq!(
            excluded.fragment,
            "(isDiscontinued = FALSE OR isDiscontinued IS NULL)"
        );
        assert_eq!(excluded.param, None);
        assert!(translate("exclude_discontinued", false).is_none());

        let cdx = translate("has_fda_cdx", true).unwrap();
        assert_eq!(cdx.fragment, "fdaCompanionDxCount > 0");
        let no_cdx = translate("has_fda_cdx", false).unwrap();
        assert_eq!(
            no_cdx.fragment,
            "(fdaCompanionDxCount = 0 OR fdaCompanionDxCount IS NULL)"
        );
        assert!(translate("has_fda_cdx", "yes").is_none());

        let keys: Vec<&str> = meta_keys().collect();
        assert_eq!(keys, vec!["exclude_discontinued", "has_fda_cdx"]);
    }

    #[test]
    fn test_null_and_unsupported_values_dropped() {
        assert!(translate("vendor", FilterValue::Null).is_none());
        assert!(translate("vendor", FilterValue::Other(serde_json::json!(["a"]))).is_none());
    }

    #[test]
    fn test_invalid_key_rejected_before_translation() {
        let table = mrd();
        let translator = FilterTranslator::new(&table);
        let err = translator
            .translate("vendor = '' OR 1=1 --", &"x".into())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(translator
            .translate("bad key", &FilterValue::Other(serde_json::json!({})))
            .is_err());
    }

    #[test]
    fn test_translate_all_keeps_order_and_counts() {
        let table = mrd();
        let filters = FilterSpec::new()
            .with("vendor", "Quest")
            .with("exclude_discontinued", false)
            .with("lod", FilterValue::Null)
            .with("min_sensitivity", 90.0)
            .with("cancerTypes", "Breast");

        let conditions = FilterTranslator::new(&table).translate_all(&filters).unwrap();
        let fragments: Vec<&str> = conditions.iter().map(|c| c.fragment.as_str()).collect();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0], "fold_case(vendor) LIKE ?");
        assert!(fragments[1].starts_with("(sensitivity >= ?"));
        assert!(fragments[2].starts_with("EXISTS"));
        assert!(conditions.iter().all(|c| c.param.is_some()));
    }

    #[test]
    fn test_filter_spec_insert_replaces_in_place() {
        let mut spec = FilterSpec::new().with("a", 1).with("b", 2);
        spec.insert("a", 3);
        let entries: Vec<(&str, &FilterValue)> = spec.iter().collect();
        assert_eq!(entries[0], ("a", &FilterValue::Int(3)));
        assert_eq!(entries[1], ("b", &FilterValue::Int(2)));
    }

    #[test]
    fn test_filter_spec_from_json_keeps_order() {
        let spec = FilterSpec::from_json(serde_json::json!({
            "vendor": "Natera",
            "min_sensitivity": 90.5,
            "cancerTypes": "Colorectal",
            "requiresTumorTissue": true,
            "lod": null
        }))
        .unwrap();
        let keys: Vec<&str> = spec.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["vendor", "min_sensitivity", "cancerTypes", "requiresTumorTissue", "lod"]
        );
        assert_eq!(spec.get("min_sensitivity"), Some(&FilterValue::Float(90.5)));
        assert!(FilterSpec::from_json(serde_json::json!([1, 2])).is_err());
    }
}
