//! Error types for the Falarica library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`FalaricaError`] enum. Configuration-shape problems are reported eagerly
//! (at engine construction or before a query is issued); failures of the
//! backing store are wrapped, never swallowed, and nothing is retried.

use thiserror::Error;

/// The main error type for Falarica operations.
#[derive(Error, Debug)]
pub enum FalaricaError {
    /// An embedding's length disagrees with the collection's fixed dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid configuration, or an invalid threshold/metric/normalization combination.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A filter expression used an operator the translator cannot render.
    #[error("unsupported filter operator: {0}")]
    UnsupportedFilterOperator(String),

    /// The backing store failed while executing a statement or query.
    #[error("query execution failed: {0}")]
    QueryExecution(#[from] anyhow::Error),

    /// DDL failure during schema management.
    #[error("schema error: {0}")]
    Schema(String),

    /// The embedding collaborator failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// JSON encoding/decoding of metadata failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with [`FalaricaError`].
pub type Result<T> = std::result::Result<T, FalaricaError>;

impl FalaricaError {
    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        FalaricaError::DimensionMismatch { expected, actual }
    }

    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        FalaricaError::Configuration(msg.into())
    }

    /// Create a new unsupported filter operator error.
    pub fn unsupported_filter<S: Into<String>>(op: S) -> Self {
        FalaricaError::UnsupportedFilterOperator(op.into())
    }

    /// Wrap a backing-store failure.
    pub fn query_execution<E: Into<anyhow::Error>>(err: E) -> Self {
        FalaricaError::QueryExecution(err.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        FalaricaError::Schema(msg.into())
    }

    /// Create a new embedding error.
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        FalaricaError::Embedding(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = FalaricaError::dimension_mismatch(768, 384);
        assert_eq!(error.to_string(), "dimension mismatch: expected 768, got 384");

        let error = FalaricaError::configuration("searchAccuracy out of range");
        assert_eq!(
            error.to_string(),
            "configuration error: searchAccuracy out of range"
        );

        let error = FalaricaError::unsupported_filter("GT on boolean operand");
        assert_eq!(
            error.to_string(),
            "unsupported filter operator: GT on boolean operand"
        );
    }

    #[test]
    fn test_query_execution_wraps_cause() {
        let error = FalaricaError::query_execution(anyhow::anyhow!("connection reset"));
        match &error {
            FalaricaError::QueryExecution(cause) => {
                assert_eq!(cause.to_string(), "connection reset");
            }
            _ => panic!("Expected QueryExecution variant"),
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = FalaricaError::from(json_error);

        match error {
            FalaricaError::Json(_) => {}
            _ => panic!("Expected JSON error variant"),
        }
    }
}
