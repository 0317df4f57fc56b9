//! Engine Error Types
//!
//! Every error surfaced by the core carries a stable kind tag so transports
//! can discriminate without parsing messages.

use crate::embeddings::EmbeddingError;
use crate::storage::StorageError;

// ============================================================================
// ERROR TYPE
// ============================================================================

/// Error surfaced by the discovery engine
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Caller-supplied input is malformed: empty/over-length query,
    /// out-of-range limit, unknown enum value. No side effects occurred.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The repository or embedding backend cannot be reached.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    /// Referenced product or search log does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// A uniqueness invariant was violated (e.g. duplicate sku).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The task was cancelled cooperatively. No search log was written.
    #[error("Cancelled")]
    Cancelled,
    /// The hard deadline elapsed before the search completed.
    #[error("Timed out")]
    Timeout,
    /// Bug or invariant violation inside the engine.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Stable tag for client-side discrimination
    pub fn kind_tag(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::Unavailable(_) => "unavailable",
            EngineError::NotFound(_) => "not_found",
            EngineError::Conflict(_) => "conflict",
            EngineError::Cancelled => "cancelled",
            EngineError::Timeout => "timeout",
            EngineError::Internal(_) => "internal",
        }
    }

    /// Whether the caller may retry the request as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Unavailable(_) | EngineError::Timeout)
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => EngineError::NotFound(what),
            StorageError::Conflict(what) => EngineError::Conflict(what),
            StorageError::Invalid(what) => EngineError::InvalidInput(what),
            StorageError::Database(e) => EngineError::Unavailable(e.to_string()),
            StorageError::Io(e) => EngineError::Unavailable(e.to_string()),
            other => EngineError::Internal(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for EngineError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::InvalidInput(what) => EngineError::InvalidInput(what),
            EmbeddingError::Timeout => EngineError::Unavailable("embedding service timed out".to_string()),
            other => EngineError::Unavailable(other.to_string()),
        }
    }
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_stable() {
        assert_eq!(EngineError::InvalidInput("x".into()).kind_tag(), "invalid_input");
        assert_eq!(EngineError::Unavailable("x".into()).kind_tag(), "unavailable");
        assert_eq!(EngineError::NotFound("x".into()).kind_tag(), "not_found");
        assert_eq!(EngineError::Conflict("x".into()).kind_tag(), "conflict");
        assert_eq!(EngineError::Cancelled.kind_tag(), "cancelled");
        assert_eq!(EngineError::Timeout.kind_tag(), "timeout");
        assert_eq!(EngineError::Internal("x".into()).kind_tag(), "internal");
    }

    #[test]
    fn test_storage_not_found_maps_to_not_found() {
        let err: EngineError = StorageError::NotFound("product 7".into()).into();
        assert_eq!(err.kind_tag(), "not_found");
    }

    #[test]
    fn test_retryable() {
        assert!(EngineError::Timeout.is_retryable());
        assert!(EngineError::Unavailable("db".into()).is_retryable());
        assert!(!EngineError::InvalidInput("q".into()).is_retryable());
    }
}
