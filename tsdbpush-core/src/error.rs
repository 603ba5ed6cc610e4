//! Error types for tsdbpush operations

use thiserror::Error;

/// Result type for tsdbpush operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Error types for the write-path front end.
///
/// Every variant is scoped to a single request; none is fatal to the
/// process. The HTTP layer decides status codes from `category()`.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot read request: {0}")]
    Read(String),

    #[error("too big packed request; mustn't exceed {max_size} bytes")]
    TooLarge { max_size: u64 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("concurrency limit reached: {0}")]
    RateLimit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IngestError {
    /// Create a new read error
    pub fn read<S: Into<String>>(message: S) -> Self {
        Self::Read(message.into())
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage(message.into())
    }

    /// Create a new rate limit error
    pub fn rate_limit<S: Into<String>>(message: S) -> Self {
        Self::RateLimit(message.into())
    }

    /// Get the error category for monitoring/metrics
    pub fn category(&self) -> &'static str {
        match self {
            IngestError::Read(_) => "read",
            IngestError::TooLarge { .. } => "too_large",
            IngestError::Parse(_) => "parse",
            IngestError::Validation(_) => "validation",
            IngestError::Storage(_) => "storage",
            IngestError::Configuration(_) => "configuration",
            IngestError::RateLimit(_) => "rate_limit",
            IngestError::Io(_) => "io",
            IngestError::Json(_) => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message_names_limit() {
        let err = IngestError::TooLarge { max_size: 1024 };
        assert!(err.to_string().contains("1024"));
        assert_eq!(err.category(), "too_large");
    }

    #[test]
    fn test_parse_helper() {
        let err = IngestError::parse("missing `metric` field");
        assert!(err.to_string().contains("missing `metric` field"));
        assert_eq!(err.category(), "parse");
    }
}
