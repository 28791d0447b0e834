//! Parameterized statements.

use std::fmt;

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// SQL NULL.
    Null,
    /// Boolean, bound as 0/1.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 text.
    Text(String),
}

impl ToSql for QueryParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            QueryParam::Null => ToSqlOutput::Owned(Value::Null),
            QueryParam::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            QueryParam::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            QueryParam::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            QueryParam::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl fmt::Display for QueryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryParam::Null => write!(f, "NULL"),
            QueryParam::Bool(b) => write!(f, "{b}"),
            QueryParam::Int(i) => write!(f, "{i}"),
            QueryParam::Float(v) => write!(f, "{v:?}"),
            QueryParam::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        QueryParam::Bool(v)
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        QueryParam::Int(v)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        QueryParam::Float(v)
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        QueryParam::Text(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        QueryParam::Text(v.to_string())
    }
}

/// An immutable statement plus the parameters for its placeholders.
///
/// The number of `?` placeholders in the statement always equals the number
/// of parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    table: String,
    sql: String,
    params: Vec<QueryParam>,
}

impl QueryPlan {
    pub(crate) fn new(table: impl Into<String>, sql: String, params: Vec<QueryParam>) -> Self {
        debug_assert_eq!(
            sql.matches('?').count(),
            params.len(),
            "placeholder count mismatch in: {sql}"
        );
        Self {
            table: table.into(),
            sql,
            params,
        }
    }

    /// Table the statement reads from.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Statement text with positional placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters in placeholder order.
    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    /// Number of placeholders in the statement.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
            write!(f, " [{}]", params.join(", "))?;
        }
        Ok(())
    }
}
