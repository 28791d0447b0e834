//! SQL functions registered on every engine connection.

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

/// Name of the Unicode case-folding function.
pub const FOLD_CASE: &str = "fold_case";

/// Unicode lowercase, applied to both sides of case-insensitive matches.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Register the engine's functions on a connection.
pub(crate) fn register(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_CASE,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let folded = match ctx.get_raw(0) {
                ValueRef::Null => None,
                ValueRef::Integer(i) => Some(i.to_string()),
                ValueRef::Real(f) => Some(f.to_string()),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    Some(fold_case(&String::from_utf8_lossy(bytes)))
                }
            };
            Ok(folded)
        },
    )
}
