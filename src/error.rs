//! Error types for ManifestWork status reconciliation

use thiserror::Error;

/// Main error type for work status operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The ManifestWork does not exist in the store
    #[error("work not found: {0}")]
    NotFound(String),

    /// The write carried a stale resource version
    #[error("conflict writing status of {0}: resource version is stale")]
    Conflict(String),

    /// Conflicts kept occurring until the retry policy gave up
    #[error("status update of {work} gave up after {attempts} conflicting attempts")]
    RetryExhausted {
        /// Work the update was for, as `namespace/name`
        work: String,
        /// Number of write attempts made
        attempts: u32,
    },

    /// The caller's mutation function failed
    #[error("status mutation failed: {0}")]
    Mutation(String),

    /// The caller cancelled the update
    #[error("status update canceled")]
    Canceled,

    /// Kubernetes API error not classified as NotFound or Conflict
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Invalid configuration value
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a mutation error with the given message
    pub fn mutation(msg: impl Into<String>) -> Self {
        Self::Mutation(msg.into())
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Returns true if this is a stale resource version conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns true if the work was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
