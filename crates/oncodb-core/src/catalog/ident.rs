//! Identifier grammar.
//!
//! Table and field names are spliced into statement text, so every name must
//! match `[A-Za-z][A-Za-z0-9_]*` before it gets anywhere near a statement.
//! Values never go through here; they are always bound as parameters.

use crate::error::Error;

/// Check a name against the identifier grammar.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Validate a field name, returning it unchanged on success.
pub fn validate_field(name: &str) -> Result<&str, Error> {
    if name.is_empty() {
        return Err(Error::validation("field name cannot be empty"));
    }
    if !is_valid_identifier(name) {
        return Err(Error::validation(format!("invalid field name: {name}")));
    }
    Ok(name)
}
