//! Publish/Subscribe Error Types

use crate::pubsub::config::ConfigError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid {kind} '{name}': {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("Invalid TTL: {message}")]
    InvalidTtl { message: String },

    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Deserialization failed: {message}")]
    DeserializationError { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

impl PubSubError {
    /// True if the store could not be reached or answered unexpectedly
    pub fn is_store_failure(&self) -> bool {
        matches!(self, PubSubError::Store(_))
    }
}

/// Result type for publish/subscribe operations
pub type PubSubResult<T> = Result<T, PubSubError>;
