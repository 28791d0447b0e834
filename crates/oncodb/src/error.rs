//! Facade error types.

use serde::Serialize;
use thiserror::Error;

/// Errors returned by [`Database`](crate::Database) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the query core.
    #[error(transparent)]
    Core(#[from] oncodb_core::Error),

    /// A lookup matched nothing.
    #[error("{message}")]
    NotFound {
        message: String,
        suggestion: Option<String>,
    },

    /// A required argument was not supplied.
    #[error("{message}")]
    MissingParameter {
        message: String,
        suggestion: Option<String>,
    },

    /// An argument is outside its allowed values.
    #[error("{message}")]
    InvalidParameter {
        message: String,
        suggestion: Option<String>,
    },
}

impl Error {
    pub(crate) fn not_found(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }

    pub(crate) fn missing(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Error::MissingParameter {
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Error::InvalidParameter {
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Core(e) => e.code(),
            Error::NotFound { .. } => "NOT_FOUND",
            Error::MissingParameter { .. } => "MISSING_PARAMETER",
            Error::InvalidParameter { .. } => "INVALID_PARAMETER",
        }
    }

    /// Hint for how to recover, if there is one.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Error::Core(_) => None,
            Error::NotFound { suggestion, .. }
            | Error::MissingParameter { suggestion, .. }
            | Error::InvalidParameter { suggestion, .. } => suggestion.as_deref(),
        }
    }

    /// Structured form for callers that render errors as data.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            error: true,
            code: self.code(),
            message: self.to_string(),
            suggestion: self.suggestion().map(str::to_string),
        }
    }
}

/// Serializable error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Always true.
    pub error: bool,
    /// Error code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Recovery hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}
