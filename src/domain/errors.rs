//! Domain errors for the roost property cache.

use thiserror::Error;

/// Errors that can occur while normalizing, storing or mutating properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A raw record is missing a field the canonical entity requires.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Property not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A mutation targeted an identifier that already has one in flight.
    #[error("Mutation conflict: property {0} has a pending mutation")]
    MutationConflict(String),

    /// The backing service failed; the message is passed through verbatim.
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}

impl StoreError {
    /// Short machine-readable name of the error kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRecord(_) => "malformed_record",
            Self::NotFound(_) => "not_found",
            Self::ValidationFailed(_) => "validation_failed",
            Self::MutationConflict(_) => "mutation_conflict",
            Self::UpstreamFailure(_) => "upstream_failure",
            Self::Snapshot(_) => "snapshot",
            Self::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_is_verbatim() {
        let err = StoreError::UpstreamFailure("503 Service Unavailable".to_string());
        assert_eq!(err.to_string(), "Upstream failure: 503 Service Unavailable");
        assert_eq!(err.kind(), "upstream_failure");
    }

    #[test]
    fn test_serde_error_converts() {
        let err: StoreError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
