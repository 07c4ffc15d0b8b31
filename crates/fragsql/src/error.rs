//! Error types for fragsql

use std::time::Duration;
use thiserror::Error;

/// Result type alias for fragsql operations
pub type FragResult<T> = Result<T, FragError>;

/// Error types raised by query engines and query execution.
///
/// Assembling fragments never fails; every variant originates from an engine
/// compiling, binding, rendering or executing the assembled text.
#[derive(Debug, Error)]
pub enum FragError {
    /// The engine rejected the assembled query text
    #[error("Query compilation error: {0}")]
    QueryCompilation(String),

    /// A binding names a parameter that has no placeholder in the compiled text
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A placeholder in the compiled text has no binding
    #[error("Unbound parameter: {0}")]
    UnboundParameter(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),
}

impl FragError {
    /// Create a compilation error
    pub fn compilation(message: impl Into<String>) -> Self {
        Self::QueryCompilation(message.into())
    }

    /// Create an unknown parameter error
    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Self::UnknownParameter(name.into())
    }

    /// Create an unbound parameter error
    pub fn unbound_parameter(name: impl Into<String>) -> Self {
        Self::UnboundParameter(name.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a compilation error
    pub fn is_compilation(&self) -> bool {
        matches!(self, Self::QueryCompilation(_))
    }

    /// Check if this is an unknown parameter error
    pub fn is_unknown_parameter(&self) -> bool {
        matches!(self, Self::UnknownParameter(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Parse a tokio_postgres error into a more specific FragError.
    ///
    /// SQLSTATE class `42` (syntax error or access rule violation) means the
    /// server could not compile the statement.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            if db_err.code().code().starts_with("42") {
                return Self::QueryCompilation(format!(
                    "{}: {}",
                    db_err.code().code(),
                    db_err.message()
                ));
            }
        }
        Self::Query(err)
    }
}
