use serde::Serialize;
use thiserror::Error;

/// A short, structured description of a tool failure.
///
/// Carries a human-readable message plus an optional numeric code for
/// the JSON-RPC boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryableError {
    /// Human-readable description.
    pub message: String,
    /// Optional machine-readable code.
    pub code: Option<i32>,
}

impl RetryableError {
    /// Creates an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Creates an error from a message and code.
    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

impl std::fmt::Display for RetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Terminal outcome of a retry execution that did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Every attempt returned a retryable error and the budget ran out.
    #[error("retries exhausted: {0}")]
    Exhausted(RetryableError),

    /// The operation returned a fatal, non-retryable error.
    #[error("fatal error: {0}")]
    Fatal(RetryableError),

    /// The total wall-clock budget elapsed between attempts.
    #[error("total timeout exceeded after {elapsed_ms} ms")]
    TimedOut {
        /// Time spent before giving up.
        elapsed_ms: u32,
    },
}

impl RetryError {
    /// The underlying tool error, when there is one.
    pub fn tool_error(&self) -> Option<&RetryableError> {
        match self {
            RetryError::Exhausted(e) | RetryError::Fatal(e) => Some(e),
            RetryError::TimedOut { .. } => None,
        }
    }
}
