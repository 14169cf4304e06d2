//! Error types for arbor operations

/// Result type for arbor operations
pub type Result<T> = std::result::Result<T, ArborError>;

/// Error types for the arbor search engine
#[derive(Debug, thiserror::Error)]
pub enum ArborError {
    /// Model backend unreachable; fatal for the current search invocation
    #[error("Backend unreachable: {0}")]
    Backend(String),

    /// A single model call failed; degraded locally, never aborts a round
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ArborError {
    /// Whether this error aborts the whole search rather than degrading
    /// a single candidate.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ArborError::Backend(_) | ArborError::Configuration(_)
        )
    }
}

impl From<String> for ArborError {
    fn from(s: String) -> Self {
        ArborError::Other(s)
    }
}

impl From<&str> for ArborError {
    fn from(s: &str) -> Self {
        ArborError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for ArborError {
    fn from(err: anyhow::Error) -> Self {
        ArborError::Other(err.to_string())
    }
}
