//! Error types for Phylax operations

/// Result type for Phylax operations
pub type Result<T> = std::result::Result<T, PhylaxError>;

/// Error types for the Phylax library itself.
///
/// These cover the library's own operational failures (bad configuration,
/// unreachable backend). Application errors flowing through capture and
/// interception are represented by [`crate::exception::Caught`], not here.
#[derive(Debug, thiserror::Error)]
pub enum PhylaxError {
    /// Reporting backend rejected or failed a capture call
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Exception channel error
    #[error("Channel error: {0}")]
    Channel(String),

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

impl From<String> for PhylaxError {
    fn from(s: String) -> Self {
        PhylaxError::Other(s)
    }
}

impl From<&str> for PhylaxError {
    fn from(s: &str) -> Self {
        PhylaxError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for PhylaxError {
    fn from(err: anyhow::Error) -> Self {
        PhylaxError::Other(err.to_string())
    }
}
