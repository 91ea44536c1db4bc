//! Error types for the schedir event store.

use thiserror::Error;

/// Errors that can occur in schedir operations.
///
/// Every failure is scoped to a single intent; none of them are fatal to the
/// process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedirError {
    /// Malformed input, detected before any persistence attempt.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing store could not be reached. Retryable by the caller.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Malformed recurrence rule '{rule}': {reason}")]
    MalformedRecurrenceRule { rule: String, reason: String },

    /// Occurrence-level edits cannot be represented without override storage.
    #[error("Unsupported scope '{scope}' for recurring event '{id}'")]
    UnsupportedScope { id: String, scope: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SchedirError {
    /// Whether the caller may retry the same intent unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SchedirError::StorageUnavailable(_))
    }
}

impl From<serde_json::Error> for SchedirError {
    fn from(e: serde_json::Error) -> Self {
        SchedirError::Serialization(e.to_string())
    }
}

/// Result type alias for schedir operations.
pub type SchedirResult<T> = Result<T, SchedirError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_errors_are_retryable() {
        assert!(SchedirError::StorageUnavailable("down".into()).is_retryable());
        assert!(!SchedirError::NotFound("abc".into()).is_retryable());
        assert!(!SchedirError::Validation("bad".into()).is_retryable());
    }

    #[test]
    fn test_unsupported_scope_message_names_event() {
        let err = SchedirError::UnsupportedScope {
            id: "abc".into(),
            scope: "occurrence".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported scope 'occurrence' for recurring event 'abc'"
        );
    }
}
