//! Subcommand execution.

use oncodb::{parse_list, parse_optional_list, Category, Database, Error, FilterSpec, SearchOptions};
use tracing::debug;

use crate::args::{Command, FilterArgs};
use crate::formatter::Formatter;

/// Run one subcommand against an open database and render its result.
pub fn execute(db: &Database, command: Command, formatter: &dyn Formatter) -> Result<String, Error> {
    debug!(command = ?command, "Executing command");

    match command {
        Command::Search {
            table,
            filters,
            fields,
            limit,
            offset,
        } => {
            let options = SearchOptions {
                fields: parse_optional_list(fields.as_deref()),
                limit,
                offset,
            };
            let records = db.search(&table, &build_filters(filters)?, &options)?;
            Ok(formatter.format_records(&records))
        }

        Command::Get { table, id, name } => {
            let record = db.get(&table, id.as_deref(), name.as_deref())?;
            Ok(formatter.format_record(&record))
        }

        Command::Compare {
            table,
            ids,
            names,
            metrics,
        } => {
            let list = |value: Option<String>| value.as_deref().map(parse_list).unwrap_or_default();
            let records = db.compare(&table, &list(ids), &list(names), &list(metrics))?;
            Ok(formatter.format_records(&records))
        }

        Command::Count {
            category,
            group_by,
            filters,
        } => {
            let category: Category = category.parse()?;
            let summary = db.count(category, group_by.as_deref(), &build_filters(filters)?)?;
            Ok(formatter.format_count(&summary))
        }

        Command::Vendors { category } => {
            let vendors = db.list_vendors(Category::parse_optional(category.as_deref())?)?;
            Ok(formatter.format_values("vendors", &vendors))
        }

        Command::CancerTypes { category } => {
            let types = db.list_cancer_types(Category::parse_optional(category.as_deref())?)?;
            Ok(formatter.format_values("cancer_types", &types))
        }

        Command::Categories => Ok(formatter.format_categories(&db.list_categories()?)),

        Command::Rows { table } => {
            let rows = db.table_row_count(&table)?;
            Ok(formatter.format_number("rows", rows))
        }
    }
}

/// JSON filters first, then `--filter` entries in the order given.
fn build_filters(args: FilterArgs) -> Result<FilterSpec, Error> {
    let mut filters = match args.filters_json {
        Some(json) => FilterSpec::from_json(json)?,
        None => FilterSpec::new(),
    };
    for (key, value) in args.filters {
        filters.insert(key, value);
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::JsonFormatter;
    use oncodb::{Config, FilterValue};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    struct TestContext {
        _dir: TempDir,
        db: Database,
    }

    impl TestContext {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mrd = serde_json::json!([
                {"id": "mrd-1", "name": "Signatera", "vendor": "Natera",
                 "sensitivity": 94, "cancerTypes": ["Colorectal"], "approach": "Tumor-informed"},
                {"id": "mrd-2", "name": "Guardant Reveal", "vendor": "Guardant Health",
                 "sensitivity": 81, "cancerTypes": ["Colorectal", "Breast"], "approach": "Tumor-naive"}
            ]);
            fs::write(dir.path().join("mrd.json"), mrd.to_string()).unwrap();
            for file in ["ecd.json", "hct.json", "tds.json", "pap.json"] {
                fs::write(dir.path().join(file), "[]").unwrap();
            }

            let db = Database::open(&Config::new(dir.path())).unwrap();
            Self { _dir: dir, db }
        }

        fn run(&self, command: Command) -> Result<serde_json::Value, Error> {
            let output = execute(&self.db, command, &JsonFormatter)?;
            Ok(serde_json::from_str(&output).unwrap())
        }
    }

    fn filters(entries: Vec<(&str, FilterValue)>) -> FilterArgs {
        FilterArgs {
            filters: entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            filters_json: None,
        }
    }

    #[test]
    fn test_search_command() {
        let ctx = TestContext::new();
        let value = ctx
            .run(Command::Search {
                table: "mrd_tests".into(),
                filters: filters(vec![("min_sensitivity", FilterValue::Int(90))]),
                fields: Some("id, name".into()),
                limit: None,
                offset: None,
            })
            .unwrap();
        assert_eq!(value, serde_json::json!([{"id": "mrd-1", "name": "Signatera"}]));
    }

    #[test]
    fn test_filters_json_then_pairs() {
        let spec = build_filters(FilterArgs {
            filters: vec![("vendor".into(), FilterValue::Text("Natera".into()))],
            filters_json: Some(serde_json::json!({"vendor": "Guardant", "approach": "naive"})),
        })
        .unwrap();
        let keys: Vec<&str> = spec.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["vendor", "approach"]);
        assert_eq!(spec.get("vendor"), Some(&FilterValue::Text("Natera".into())));
    }

    #[test]
    fn test_count_and_lists() {
        let ctx = TestContext::new();
        let value = ctx
            .run(Command::Count {
                category: "MRD".into(),
                group_by: Some("vendor".into()),
                filters: FilterArgs::default(),
            })
            .unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["group_by"], "vendor");

        let value = ctx
            .run(Command::CancerTypes {
                category: Some("mrd".into()),
            })
            .unwrap();
        assert_eq!(value, serde_json::json!({"cancer_types": ["Breast", "Colorectal"]}));

        let value = ctx.run(Command::Rows { table: "mrd_tests".into() }).unwrap();
        assert_eq!(value, serde_json::json!({"rows": 2}));
    }

    #[test]
    fn test_compare_by_names() {
        let ctx = TestContext::new();
        let value = ctx
            .run(Command::Compare {
                table: "mrd_tests".into(),
                ids: None,
                names: Some("Signatera, Guardant Reveal".into()),
                metrics: Some("name,approach".into()),
            })
            .unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"name": "Signatera", "approach": "Tumor-informed"},
                {"name": "Guardant Reveal", "approach": "Tumor-naive"}
            ])
        );
    }

    #[test]
    fn test_errors_propagate() {
        let ctx = TestContext::new();

        let err = ctx
            .run(Command::Get {
                table: "mrd_tests".into(),
                id: Some("mrd-9".into()),
                name: None,
            })
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let err = ctx.run(Command::Vendors { category: Some("trm".into()) }).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");
    }
}
