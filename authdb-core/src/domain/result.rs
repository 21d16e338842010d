//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// The caller passed criteria or updates the store cannot accept
    /// (no criteria, unknown field, immutable field, wrong value kind).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Raised by DuckDB, including NOT NULL and CHECK constraint violations
    #[error("Storage error: {0}")]
    Storage(#[from] duckdb::Error),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        assert!(Error::invalid_argument("no criteria").is_invalid_argument());
        assert!(Error::not_found("user 7").is_not_found());
        assert!(!Error::not_found("user 7").is_invalid_argument());
    }

    #[test]
    fn test_error_display() {
        let err = Error::invalid_argument("unknown field 'bogus'");
        assert_eq!(err.to_string(), "Invalid argument: unknown field 'bogus'");

        let err = Error::not_found("no user matches id = 3");
        assert!(err.to_string().starts_with("Not found"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
