use picomcp_core::RuntimeEvent;

/// Events emitted by the retry executor.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A retry is about to be made after the given delay.
    RetryScheduled {
        executor_name: String,
        at_ms: u32,
        attempt: u32,
        delay_ms: u32,
    },
    /// The operation succeeded.
    Succeeded {
        executor_name: String,
        at_ms: u32,
        attempts: u32,
    },
    /// All retry attempts were exhausted.
    GaveUp {
        executor_name: String,
        at_ms: u32,
        attempts: u32,
    },
    /// The operation returned a fatal error; no retry was made.
    FatalError {
        executor_name: String,
        at_ms: u32,
        attempt: u32,
    },
    /// The total wall-clock budget elapsed between attempts.
    TimedOut {
        executor_name: String,
        at_ms: u32,
        elapsed_ms: u32,
    },
}

impl RuntimeEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::RetryScheduled { .. } => "retry_scheduled",
            RetryEvent::Succeeded { .. } => "succeeded",
            RetryEvent::GaveUp { .. } => "gave_up",
            RetryEvent::FatalError { .. } => "fatal_error",
            RetryEvent::TimedOut { .. } => "timed_out",
        }
    }

    fn at_ms(&self) -> u32 {
        match self {
            RetryEvent::RetryScheduled { at_ms, .. }
            | RetryEvent::Succeeded { at_ms, .. }
            | RetryEvent::GaveUp { at_ms, .. }
            | RetryEvent::FatalError { at_ms, .. }
            | RetryEvent::TimedOut { at_ms, .. } => *at_ms,
        }
    }

    fn component(&self) -> &str {
        match self {
            RetryEvent::RetryScheduled { executor_name, .. }
            | RetryEvent::Succeeded { executor_name, .. }
            | RetryEvent::GaveUp { executor_name, .. }
            | RetryEvent::FatalError { executor_name, .. }
            | RetryEvent::TimedOut { executor_name, .. } => executor_name,
        }
    }
}
