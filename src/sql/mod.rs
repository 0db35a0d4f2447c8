//! Relational-dialect rendering and the transport seam.
//!
//! Every statement this crate issues is a [`Statement`]: SQL text with `?`
//! placeholders plus bound [`SqlValue`]s in order. The rendering functions
//! in [`ddl`], [`dml`], [`select`], and [`filter`] are pure; the
//! [`Transport`] trait is the injection point for whatever database driver
//! the application uses — the wire protocol itself is out of scope.

pub mod client;
pub mod ddl;
pub mod dml;
pub mod filter;
pub mod select;

pub use client::SqlStoreClient;

use std::collections::HashMap;

use crate::vector::NativeVector;

/// A bind value for a parameterized statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Text / VARCHAR / CLOB.
    Text(String),
    /// Signed integer.
    Int(i64),
    /// Double precision float.
    Float(f64),
    /// Semi-structured JSON document, passed as its text form.
    Json(String),
    /// Native vector literal.
    Vector(NativeVector),
}

/// A parameterized SQL statement: text with `?` placeholders and the bound
/// values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement text.
    pub sql: String,
    /// Bind values, one per `?`.
    pub binds: Vec<SqlValue>,
}

impl Statement {
    /// A statement with no binds (DDL, or batch statements whose binds are
    /// supplied per row).
    pub fn new<S: Into<String>>(sql: S) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// A statement with binds.
    pub fn with_binds<S: Into<String>>(sql: S, binds: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            binds,
        }
    }
}

/// One result row, keyed by lowercase column name.
#[derive(Debug, Clone, Default)]
pub struct SqlRow {
    columns: HashMap<String, SqlValue>,
}

impl SqlRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value.
    pub fn set<S: Into<String>>(&mut self, column: S, value: SqlValue) {
        self.columns.insert(column.into().to_lowercase(), value);
    }

    /// Builder-style [`set`](Self::set).
    pub fn with<S: Into<String>>(mut self, column: S, value: SqlValue) -> Self {
        self.set(column, value);
        self
    }

    /// Get a column value.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.get(&column.to_lowercase())
    }

    /// Text view of a column.
    pub fn text(&self, column: &str) -> anyhow::Result<&str> {
        match self.get(column) {
            Some(SqlValue::Text(s)) | Some(SqlValue::Json(s)) => Ok(s),
            Some(other) => anyhow::bail!("column {column:?} is not text: {other:?}"),
            None => anyhow::bail!("missing column {column:?}"),
        }
    }

    /// Float view of a column (integers widen).
    pub fn float(&self, column: &str) -> anyhow::Result<f64> {
        match self.get(column) {
            Some(SqlValue::Float(v)) => Ok(*v),
            Some(SqlValue::Int(v)) => Ok(*v as f64),
            Some(other) => anyhow::bail!("column {column:?} is not numeric: {other:?}"),
            None => anyhow::bail!("missing column {column:?}"),
        }
    }

    /// Native-vector view of a column.
    pub fn vector(&self, column: &str) -> anyhow::Result<NativeVector> {
        match self.get(column) {
            Some(SqlValue::Vector(v)) => Ok(v.clone()),
            Some(SqlValue::Text(s)) => Ok(NativeVector::from_literal(s.clone())),
            Some(other) => anyhow::bail!("column {column:?} is not a vector: {other:?}"),
            None => anyhow::bail!("missing column {column:?}"),
        }
    }
}

/// Blocking statement executor backed by a database driver.
///
/// No method retries; cancellation and timeouts are the driver's concern.
pub trait Transport: Send + Sync {
    /// Execute a statement, returning the number of affected rows.
    fn execute(&self, statement: &Statement) -> anyhow::Result<u64>;

    /// Execute a statement once per bind row as a single batched operation.
    ///
    /// Either the whole batch lands or an error is returned; partial
    /// application is resolved by the store's own batch contract.
    fn execute_batch(&self, statement: &Statement, rows: &[Vec<SqlValue>]) -> anyhow::Result<u64>;

    /// Execute a query, returning result rows.
    fn query(&self, statement: &Statement) -> anyhow::Result<Vec<SqlRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_access_is_case_insensitive() {
        let row = SqlRow::new().with("ID", SqlValue::Text("a".into()));
        assert_eq!(row.text("id").unwrap(), "a");
        assert_eq!(row.text("Id").unwrap(), "a");
    }

    #[test]
    fn test_typed_views() {
        let row = SqlRow::new()
            .with("distance", SqlValue::Float(0.25))
            .with("count", SqlValue::Int(3))
            .with("embedding", SqlValue::Text("[1,2]".into()));
        assert_eq!(row.float("distance").unwrap(), 0.25);
        assert_eq!(row.float("count").unwrap(), 3.0);
        assert_eq!(row.vector("embedding").unwrap().as_str(), "[1,2]");
        assert!(row.text("distance").is_err());
        assert!(row.float("missing").is_err());
    }
}
