//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use oncodb::{CategoryInfo, CountSummary, ErrorReport, FieldValue, Record};
use serde::Serialize;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format a list of records.
    fn format_records(&self, records: &[Record]) -> String;

    /// Format a single record.
    fn format_record(&self, record: &Record) -> String;

    /// Format a count, with its groups when present.
    fn format_count(&self, summary: &CountSummary) -> String;

    /// Format a list of distinct values under a heading.
    fn format_values(&self, heading: &str, values: &[String]) -> String;

    /// Format category metadata.
    fn format_categories(&self, categories: &[CategoryInfo]) -> String;

    /// Format a single labelled number.
    fn format_number(&self, label: &str, value: u64) -> String;

    /// Format an error report.
    fn format_error(&self, report: &ErrorReport) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_records(&self, records: &[Record]) -> String {
        if records.is_empty() {
            return "No results".to_string();
        }

        // Records may carry different fields; keep first-seen order.
        let mut columns: Vec<&str> = Vec::new();
        for record in records {
            for name in record.field_names() {
                if !columns.contains(&name) {
                    columns.push(name);
                }
            }
        }

        let mut table = Table::new();
        table.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());
        for record in records {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|column| Cell::new(display_cell(record.get(column))))
                .collect();
            table.add_row(cells);
        }

        format!("{}\n{} row(s)", table, records.len())
    }

    fn format_record(&self, record: &Record) -> String {
        let mut table = Table::new();
        table.set_header(vec!["field", "value"]);
        for (name, value) in record.iter() {
            table.add_row(vec![Cell::new(name), Cell::new(display_cell(Some(value)))]);
        }
        table.to_string()
    }

    fn format_count(&self, summary: &CountSummary) -> String {
        let Some(group_by) = &summary.group_by else {
            return format!("Total: {}", summary.total);
        };

        let mut table = Table::new();
        table.set_header(vec![group_by.as_str(), "count"]);
        for group in &summary.groups {
            table.add_row(vec![Cell::new(&group.value), Cell::new(group.count)]);
        }
        format!("{}\nTotal: {}", table, summary.total)
    }

    fn format_values(&self, heading: &str, values: &[String]) -> String {
        if values.is_empty() {
            return "No results".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec![heading]);
        for value in values {
            table.add_row(vec![value]);
        }
        format!("{}\n{} value(s)", table, values.len())
    }

    fn format_categories(&self, categories: &[CategoryInfo]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["id", "name", "tests", "description"]);
        for info in categories {
            table.add_row(vec![
                Cell::new(info.id),
                Cell::new(info.name),
                Cell::new(info.test_count),
                Cell::new(info.description),
            ]);
        }
        table.to_string()
    }

    fn format_number(&self, label: &str, value: u64) -> String {
        format!("{label}: {value}")
    }

    fn format_error(&self, report: &ErrorReport) -> String {
        match &report.suggestion {
            Some(hint) => format!("Error [{}]: {}\nHint: {}", report.code, report.message, hint),
            None => format!("Error [{}]: {}", report.code, report.message),
        }
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_records(&self, records: &[Record]) -> String {
        to_json(&records)
    }

    fn format_record(&self, record: &Record) -> String {
        to_json(record)
    }

    fn format_count(&self, summary: &CountSummary) -> String {
        to_json(summary)
    }

    fn format_values(&self, heading: &str, values: &[String]) -> String {
        to_json(&serde_json::json!({ heading: values }))
    }

    fn format_categories(&self, categories: &[CategoryInfo]) -> String {
        to_json(&categories)
    }

    fn format_number(&self, label: &str, value: u64) -> String {
        to_json(&serde_json::json!({ label: value }))
    }

    fn format_error(&self, report: &ErrorReport) -> String {
        to_json(report)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": true, \"message\": \"{e}\"}}"))
}

fn display_cell(value: Option<&FieldValue>) -> String {
    match value {
        None | Some(FieldValue::Null) => String::new(),
        Some(value) => value.to_string(),
    }
}
