use thiserror::Error;

/// Errors returned by the task manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The pool is at capacity and every excess task is still live.
    #[error("task pool full; no terminal task available for eviction")]
    PoolFull,
}
