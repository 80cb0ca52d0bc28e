use crate::breaker::CircuitState;
use picomcp_core::RuntimeEvent;

/// Events emitted by a circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The breaker changed state.
    StateTransition {
        breaker_name: String,
        at_ms: u32,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A request was allowed through.
    CallPermitted {
        breaker_name: String,
        at_ms: u32,
        state: CircuitState,
    },
    /// A request was rejected because the circuit is open.
    CallRejected {
        breaker_name: String,
        at_ms: u32,
        retry_after_ms: u32,
    },
    /// A success outcome was recorded.
    SuccessRecorded {
        breaker_name: String,
        at_ms: u32,
        state: CircuitState,
    },
    /// A failure outcome was recorded.
    FailureRecorded {
        breaker_name: String,
        at_ms: u32,
        state: CircuitState,
    },
}

impl RuntimeEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn at_ms(&self) -> u32 {
        match self {
            CircuitBreakerEvent::StateTransition { at_ms, .. }
            | CircuitBreakerEvent::CallPermitted { at_ms, .. }
            | CircuitBreakerEvent::CallRejected { at_ms, .. }
            | CircuitBreakerEvent::SuccessRecorded { at_ms, .. }
            | CircuitBreakerEvent::FailureRecorded { at_ms, .. } => *at_ms,
        }
    }

    fn component(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { breaker_name, .. }
            | CircuitBreakerEvent::CallPermitted { breaker_name, .. }
            | CircuitBreakerEvent::CallRejected { breaker_name, .. }
            | CircuitBreakerEvent::SuccessRecorded { breaker_name, .. }
            | CircuitBreakerEvent::FailureRecorded { breaker_name, .. } => breaker_name,
        }
    }
}
