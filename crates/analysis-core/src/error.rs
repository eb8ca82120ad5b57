use thiserror::Error;

/// Failure talking to the DART open API.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("DART status {status}: {message}")]
    DartStatus { status: String, message: String },
}

/// Failure reported by a remote text generator.
///
/// Only the kind matters to callers: rate limiting is worth retrying,
/// anything else is not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Generation failed: {0}")]
    Other(String),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::RateLimited(_))
    }
}
