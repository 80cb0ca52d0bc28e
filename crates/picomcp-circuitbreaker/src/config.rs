use crate::breaker::{CircuitBreaker, CircuitState};
use crate::events::CircuitBreakerEvent;
use picomcp_core::{EventListeners, FnListener, MonotonicClock, SharedClock};

/// Configuration for a circuit breaker.
pub struct CircuitBreakerConfig {
    pub(crate) failure_threshold: u32,
    pub(crate) recovery_timeout_ms: u32,
    pub(crate) half_open_success_threshold: u32,
    pub(crate) clock: SharedClock,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    pub(crate) fn with_name(&self, name: &str) -> Self {
        Self {
            failure_threshold: self.failure_threshold,
            recovery_timeout_ms: self.recovery_timeout_ms,
            half_open_success_threshold: self.half_open_success_threshold,
            clock: self.clock.clone(),
            event_listeners: self.event_listeners.clone(),
            name: name.to_string(),
        }
    }
}

/// Builder for configuring and constructing a circuit breaker.
pub struct CircuitBreakerConfigBuilder {
    failure_threshold: u32,
    recovery_timeout_ms: u32,
    half_open_success_threshold: u32,
    clock: Option<SharedClock>,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl CircuitBreakerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_ms: 30_000,
            half_open_success_threshold: 1,
            clock: None,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the number of consecutive failures that trip the circuit.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Sets how long the circuit stays open before admitting a probe.
    ///
    /// Default: 30 000 ms
    pub fn recovery_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.recovery_timeout_ms = timeout_ms;
        self
    }

    /// Sets the number of consecutive half-open successes required to
    /// close the circuit.
    ///
    /// Default: 1
    pub fn half_open_success_threshold(mut self, threshold: u32) -> Self {
        self.half_open_success_threshold = threshold.max(1);
        self
    }

    /// Sets the clock the breaker reads for recovery timing.
    ///
    /// Default: a fresh [`MonotonicClock`]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Give this breaker a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Register a callback for state transition events.
    ///
    /// Fired on every actual state change, never on no-op calls.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(*from_state, *to_state);
                }
            }));
        self
    }

    /// Register a callback for rejected calls.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::CallRejected { retry_after_ms, .. } = event {
                    f(*retry_after_ms);
                }
            }));
        self
    }

    /// Builds the configuration without constructing a breaker. Used
    /// as the shared template of a registry.
    pub fn build_config(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout_ms: self.recovery_timeout_ms,
            half_open_success_threshold: self.half_open_success_threshold,
            clock: self.clock.unwrap_or_else(MonotonicClock::shared),
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds a circuit breaker.
    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker::new(self.build_config())
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
