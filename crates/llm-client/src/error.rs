use analysis_core::GenerationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Timeout")]
    Timeout,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

impl LlmError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited(_))
    }
}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::RateLimited(message) => GenerationError::RateLimited(message),
            other => GenerationError::Other(other.to_string()),
        }
    }
}
