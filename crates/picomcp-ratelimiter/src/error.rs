use thiserror::Error;

/// Errors surfaced at the dispatch boundary for rate limiting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// The bucket had insufficient tokens for the request.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    LimitExceeded {
        /// Recommended wait before retrying.
        retry_after_ms: u32,
    },
}

impl RateLimitError {
    /// Recommended wait before retrying, in milliseconds.
    pub fn retry_after_ms(&self) -> u32 {
        match self {
            RateLimitError::LimitExceeded { retry_after_ms } => *retry_after_ms,
        }
    }
}
