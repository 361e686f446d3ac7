//! Common error types for CloudFiles.

use std::fmt;

use thiserror::Error;

/// Top-level error type for CloudFiles operations.
///
/// Never returned from the public operation layer; operations flatten it
/// into `None`/`false` after logging.
#[derive(Debug, Error)]
pub enum Error {
    /// The referenced object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network, permission, throttling or service failure.
    #[error("Backend error: {0}")]
    Backend(String),

    /// At least one item of a concurrent batch failed.
    #[error("Batch failed: {failed} of {total} item(s), first cause: {cause}")]
    PartialBatchFailure {
        failed: usize,
        total: usize,
        cause: Box<Error>,
    },

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`], used for the logging decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Backend,
    PartialBatchFailure,
    InvalidInput,
    Io,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Backend(_) => ErrorKind::Backend,
            Error::PartialBatchFailure { .. } => ErrorKind::PartialBatchFailure,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether this is an expected "object does not exist" condition.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Backend => "backend",
            ErrorKind::PartialBatchFailure => "partial_batch_failure",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::NotFound("k".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Backend("boom".into()).kind(), ErrorKind::Backend);
        assert!(Error::NotFound("k".into()).is_not_found());
        assert!(!Error::Backend("boom".into()).is_not_found());
    }

    #[test]
    fn test_batch_failure_message() {
        let err = Error::PartialBatchFailure {
            failed: 1,
            total: 3,
            cause: Box::new(Error::Backend("access denied".into())),
        };
        assert_eq!(err.kind(), ErrorKind::PartialBatchFailure);
        assert_eq!(
            err.to_string(),
            "Batch failed: 1 of 3 item(s), first cause: Backend error: access denied"
        );
    }
}
