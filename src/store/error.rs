//! Store Error Types

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Invalid store address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Unexpected value at key '{key}': {message}")]
    UnexpectedValue { key: String, message: String },

    #[error("Store lock poisoned: {message}")]
    LockPoisoned { message: String },
}

impl From<redis::RedisError> for StoreError {
    fn from(error: redis::RedisError) -> Self {
        StoreError::Unavailable {
            message: error.to_string(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
