//! Error types for fakedb

use thiserror::Error;

/// Result type alias for fakedb operations
pub type DbResult<T> = Result<T, DbError>;

/// Message used by every operation the fake does not emulate.
pub(crate) const UNSUPPORTED: &str = "currently unsupported in test suite.";

/// Error types for fake database operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    /// A blank query string was passed to `prepare` or `query`
    #[error("Empty query string")]
    EmptyQuery,

    /// The template has more placeholders than bound values
    #[error("Compile error: {0}")]
    Compile(String),

    /// The matching expectation was registered to fail
    #[error("Query error: {message} ({query})")]
    QueryExecution { message: String, query: String },

    /// Cursor seek or field access outside the result buffer
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// Feature the fake intentionally does not emulate
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A statement was expected to produce a result set but did not
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DbError {
    /// Create a compile error
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile(message.into())
    }

    /// Create a query execution error for a registered failure
    pub fn query_execution(message: impl Into<String>, query: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: message.into(),
            query: query.into(),
        }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::OutOfBounds(message.into())
    }

    /// Create an unsupported operation error with the standard message
    pub fn unsupported() -> Self {
        Self::Unsupported(UNSUPPORTED.to_string())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a compile error
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }

    /// Check if this is a registered query failure
    pub fn is_query_execution(&self) -> bool {
        matches!(self, Self::QueryExecution { .. })
    }

    /// Check if this is an out of bounds error
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds(_))
    }

    /// Check if this is an unsupported operation error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
