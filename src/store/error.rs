//! Credential store error types.

use thiserror::Error;

/// Result type for credential store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during credential store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No credential blob exists for the session id.
    #[error("no credentials for session: {0}")]
    NotFound(String),

    /// Session id is not usable as a storage key.
    #[error("invalid session id: {0}")]
    InvalidKey(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend error.
    #[error("backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::NotFound("abcd".to_string());
        assert_eq!(err.to_string(), "no credentials for session: abcd");
    }
}
