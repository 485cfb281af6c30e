//! Error types and result aliases for Cask operations.
//!
//! Provides a unified error type covering every failure mode of the
//! content-addressed write path, carrying the values a caller needs to
//! diagnose the failure or decide on a retry.

use thiserror::Error;

/// Unified error type for all Cask operations
#[derive(Error, Debug)]
pub enum CaskError {
    // Construction errors
    #[error("Staging file already exists: {path}")]
    Conflict { path: String },

    #[error("Destination path has no file name: {path}")]
    MissingFileName { path: String },

    // Writer state errors
    #[error("Writer is already closed")]
    AlreadyClosed,

    // Verification errors
    #[error("Content mismatch: expected OID {expected}, got {actual}")]
    ContentMismatch { expected: String, actual: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Cask operations
pub type CaskResult<T> = Result<T, CaskError>;

impl CaskError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is a staging-file conflict.
    ///
    /// A conflict means another writer holds the staging path for the same
    /// destination; the caller owns the retry policy.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CaskError::Conflict { .. })
    }

    /// Check if this error is a content mismatch
    pub fn is_mismatch(&self) -> bool {
        matches!(self, CaskError::ContentMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_carries_both_oids() {
        let err = CaskError::ContentMismatch {
            expected: "aaaa".to_string(),
            actual: "bbbb".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("mismatch"));
        assert!(message.contains("aaaa"));
        assert!(message.contains("bbbb"));
    }

    #[test]
    fn test_predicates() {
        let conflict = CaskError::Conflict {
            path: "/store/oid-temp".to_string(),
        };
        assert!(conflict.is_conflict());
        assert!(!conflict.is_mismatch());
        assert!(!CaskError::AlreadyClosed.is_conflict());
    }

    #[test]
    fn test_io_preserves_source() {
        use std::error::Error;

        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CaskError::io("Failed to create staging file".to_string(), source);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("Failed to create staging file"));
    }
}
