//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use oncodb::{Config, FilterValue, StorageMode, DEFAULT_DATA_DIR};

use crate::formatter::OutputFormat;

/// OncoDB Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "oncodb")]
#[command(version, about = "Query diagnostic test catalogs", long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Where datasets come from and how the engine stores them.
#[derive(ClapArgs, Debug)]
pub struct DatabaseArgs {
    /// Directory holding the dataset files.
    #[arg(short, long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Engine storage mode.
    #[arg(long, default_value = "memory", value_enum)]
    pub storage: StorageArg,

    /// Directory for temporary engine files (temp-file mode).
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Read one table from a specific file, as TABLE=PATH. Repeatable.
    #[arg(long = "source", value_parser = parse_source)]
    pub sources: Vec<(String, PathBuf)>,
}

impl DatabaseArgs {
    /// Convert command-line arguments to database configuration.
    pub fn into_config(self) -> Config {
        let mut config = Config::new(self.data_dir).with_storage_mode(self.storage.into());
        if let Some(dir) = self.scratch_dir {
            config = config.with_scratch_dir(dir);
        }
        for (table, path) in self.sources {
            config = config.with_source(table, path);
        }
        config
    }
}

/// Storage mode as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageArg {
    /// Keep the engine in memory
    Memory,
    /// Back the engine with a temporary file
    TempFile,
}

impl From<StorageArg> for StorageMode {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Memory => StorageMode::Memory,
            StorageArg::TempFile => StorageMode::TempFile,
        }
    }
}

/// Filters given on the command line.
#[derive(ClapArgs, Debug, Default)]
pub struct FilterArgs {
    /// Filter as KEY=VALUE. Numbers and booleans are typed. Repeatable.
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, FilterValue)>,

    /// Filters as a JSON object, applied before --filter entries.
    #[arg(long, value_parser = parse_json_object)]
    pub filters_json: Option<serde_json::Value>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search a table with filters
    Search {
        /// Table to search
        table: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Comma-separated fields to return
        #[arg(long)]
        fields: Option<String>,

        /// Maximum records to return
        #[arg(long)]
        limit: Option<i64>,

        /// Records to skip
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Fetch one record by id or name
    Get {
        /// Table to read
        table: String,

        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,
    },

    /// Compare several records side by side
    Compare {
        /// Table to read
        table: String,

        /// Comma-separated ids
        #[arg(long)]
        ids: Option<String>,

        /// Comma-separated names, used when no ids are given
        #[arg(long)]
        names: Option<String>,

        /// Comma-separated metrics; defaults depend on the category
        #[arg(long)]
        metrics: Option<String>,
    },

    /// Count tests in a category
    Count {
        /// Category id (mrd, ecd, hct, tds)
        category: String,

        /// Field to group counts by
        #[arg(long)]
        group_by: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// List distinct vendors
    Vendors {
        /// Restrict to one category
        #[arg(long)]
        category: Option<String>,
    },

    /// List distinct cancer types
    CancerTypes {
        /// Restrict to one category
        #[arg(long)]
        category: Option<String>,
    },

    /// List categories with their test counts
    Categories,

    /// Show the number of rows in a table
    Rows {
        /// Table to count
        table: String,
    },
}

fn parse_source(s: &str) -> Result<(String, PathBuf), String> {
    let (table, path) = split_pair(s)?;
    Ok((table.to_string(), PathBuf::from(path)))
}

fn parse_filter(s: &str) -> Result<(String, FilterValue), String> {
    let (key, raw) = split_pair(s)?;
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value @ (serde_json::Value::Bool(_) | serde_json::Value::Number(_))) => value.into(),
        Ok(serde_json::Value::Null) => FilterValue::Null,
        _ => FilterValue::Text(raw.to_string()),
    };
    Ok((key.to_string(), value))
}

fn parse_json_object(s: &str) -> Result<serde_json::Value, String> {
    let value: serde_json::Value =
        serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))?;
    if !value.is_object() {
        return Err("expected a JSON object".to_string());
    }
    Ok(value)
}

fn split_pair(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
