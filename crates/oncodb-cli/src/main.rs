//! OncoDB Command-Line Client
//!
//! Loads the dataset files, runs one query, and prints the result.

mod args;
mod commands;
mod formatter;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oncodb::Database;

use crate::args::Args;
use crate::formatter::create_formatter;

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only results.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oncodb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Args {
        database,
        format,
        command,
    } = Args::parse();
    let config = database.into_config();
    let formatter = create_formatter(format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        storage = ?config.storage.mode,
        "Configuration loaded"
    );

    let result = Database::open(&config).and_then(|db| {
        let output = commands::execute(&db, command, formatter.as_ref());
        db.close();
        output
    });

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "Command failed");
            eprintln!("{}", formatter.format_error(&e.report()));
            ExitCode::FAILURE
        }
    }
}
