//! Core error types.

use thiserror::Error;

/// Core query and ingestion errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected input: unknown table, malformed identifier, empty key list.
    ///
    /// Raised before any statement text is built.
    #[error("validation error: {0}")]
    Validation(String),

    /// The engine failed to run a well-formed, parameterized statement.
    #[error("query execution failed: {0}")]
    QueryExecution(String),

    /// A dataset source could not be opened, read, or parsed.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// Ingested records are missing required fields.
    #[error(
        "table {table} has {count} record(s) with missing required fields ({}){}",
        .fields.join(", "),
        format_samples(.samples)
    )]
    DataValidation {
        /// Table that failed validation.
        table: String,
        /// Number of violating records.
        count: u64,
        /// Fields that every record must carry.
        fields: Vec<String>,
        /// Up to five sample rows describing the violations.
        samples: Vec<String>,
    },
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "INVALID_PARAMETER",
            Error::QueryExecution(_) => "QUERY_ERROR",
            Error::Initialization(_) => "INITIALIZATION_ERROR",
            Error::DataValidation { .. } => "DATA_VALIDATION_ERROR",
        }
    }

    /// Returns true for errors that abort startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Initialization(_) | Error::DataValidation { .. })
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

fn format_samples(samples: &[String]) -> String {
    samples
        .iter()
        .map(|sample| format!("\n  - {sample}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_validation_message_lists_samples() {
        let err = Error::DataValidation {
            table: "mrd_tests".to_string(),
            count: 2,
            fields: vec!["id".into(), "name".into(), "vendor".into()],
            samples: vec![
                "id=mrd-1, name=null, vendor=Natera".into(),
                "id=mrd-2, name=Reveal, vendor=null".into(),
            ],
        };

        let message = err.to_string();
        assert!(message.starts_with(
            "table mrd_tests has 2 record(s) with missing required fields (id, name, vendor)"
        ));
        assert!(message.contains("\n  - id=mrd-1, name=null, vendor=Natera"));
        assert!(message.contains("\n  - id=mrd-2, name=Reveal, vendor=null"));
        assert!(err.is_fatal());
        assert_eq!(err.code(), "DATA_VALIDATION_ERROR");
    }

    #[test]
    fn test_codes() {
        assert_eq!(Error::validation("x").code(), "INVALID_PARAMETER");
        assert_eq!(Error::QueryExecution("x".into()).code(), "QUERY_ERROR");
        assert!(!Error::QueryExecution("x".into()).is_fatal());
        assert!(Error::Initialization("x".into()).is_fatal());
    }
}
