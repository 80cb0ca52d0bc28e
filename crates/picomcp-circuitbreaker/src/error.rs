use thiserror::Error;

/// Errors surfaced at the dispatch boundary for circuit breaking.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CircuitBreakerError {
    /// The circuit is open; the call was not permitted.
    #[error("circuit is open; retry after {retry_after_ms} ms")]
    Open {
        /// Time remaining until the breaker will admit a probe.
        retry_after_ms: u32,
    },
}

impl CircuitBreakerError {
    /// Time remaining until a probe will be admitted, in milliseconds.
    pub fn retry_after_ms(&self) -> u32 {
        match self {
            CircuitBreakerError::Open { retry_after_ms } => *retry_after_ms,
        }
    }
}
