//! Error types for TreeForge

use thiserror::Error;

/// Main error type for TreeForge operations
#[derive(Debug, Error)]
pub enum TreeForgeError {
    /// Tree shape or chunk sizes are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The backend verifier rejected a generated function
    #[error("Emit failure in {function}: {message}")]
    EmitFailure { function: String, message: String },

    /// Cache entry exists but does not describe the expected evaluators
    #[error("Cache corruption in {key}: {message}")]
    CacheCorruption { key: String, message: String },

    /// No native code backend for this host
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Cache entry could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem error while reading or writing cache entries
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TreeForgeError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        TreeForgeError::InvalidConfig(message.into())
    }

    pub fn emit_failure(function: impl Into<String>, message: impl ToString) -> Self {
        TreeForgeError::EmitFailure {
            function: function.into(),
            message: message.to_string(),
        }
    }

    pub fn cache_corruption(key: impl Into<String>, message: impl ToString) -> Self {
        TreeForgeError::CacheCorruption {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for TreeForge operations
pub type Result<T> = std::result::Result<T, TreeForgeError>;
