use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
use picomcp_core::elapsed_ms;
use serde::Serialize;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed,
    /// The circuit is open and calls are rejected.
    Open,
    /// The circuit is half-open and a probe call is allowed.
    HalfOpen,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    failures: u64,
    successes: u64,
    rejected: u64,
    trips: u64,
}

/// Point-in-time view of a breaker, serialized as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub total_failures: u64,
    pub total_successes: u64,
    pub rejected_count: u64,
    pub trip_count: u64,
}

/// A consecutive-failure circuit breaker.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_ms: u32,
    last_state_change_ms: u32,
    pub(crate) last_access_ms: u32,
    totals: Totals,
}

impl CircuitBreaker {
    pub(crate) fn new(config: CircuitBreakerConfig) -> Self {
        let now = config.clock.now_ms();
        Self {
            config,
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_ms: now,
            last_state_change_ms: now,
            last_access_ms: now,
            totals: Totals::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Name this breaker was registered under.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Decides whether a request may proceed.
    ///
    /// In `Open`, once the recovery timeout has elapsed since the last
    /// failure, the breaker transitions to `HalfOpen` and admits the
    /// probe. Exactly one probe may be in flight per half-open cycle;
    /// the single-threaded dispatch loop enforces this.
    pub fn allow_request(&mut self) -> bool {
        let now = self.config.clock.now_ms();
        self.last_access_ms = now;
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => {
                self.config
                    .event_listeners
                    .emit(&CircuitBreakerEvent::CallPermitted {
                        breaker_name: self.config.name.clone(),
                        at_ms: now,
                        state: self.state,
                    });
                true
            }
            CircuitState::Open => {
                if elapsed_ms(now, self.last_failure_ms) >= self.config.recovery_timeout_ms {
                    self.transition_to(CircuitState::HalfOpen, now);
                    self.config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallPermitted {
                            breaker_name: self.config.name.clone(),
                            at_ms: now,
                            state: self.state,
                        });
                    true
                } else {
                    self.totals.rejected += 1;
                    let retry_after_ms = self.retry_after_ms();
                    self.config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallRejected {
                            breaker_name: self.config.name.clone(),
                            at_ms: now,
                            retry_after_ms,
                        });
                    #[cfg(feature = "metrics")]
                    metrics::counter!("picomcp_circuitbreaker_rejections_total", "breaker" => self.config.name.clone()).increment(1);
                    false
                }
            }
        }
    }

    /// Records a successful call outcome.
    pub fn record_success(&mut self) {
        let now = self.config.clock.now_ms();
        self.last_access_ms = now;
        self.totals.successes += 1;
        self.config
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                breaker_name: self.config.name.clone(),
                at_ms: now,
                state: self.state,
            });
        match self.state {
            CircuitState::Closed => {
                self.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                self.success_count += 1;
                if self.success_count >= self.config.half_open_success_threshold {
                    self.transition_to(CircuitState::Closed, now);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Records a failed call outcome.
    pub fn record_failure(&mut self) {
        let now = self.config.clock.now_ms();
        self.last_access_ms = now;
        self.last_failure_ms = now;
        self.totals.failures += 1;
        self.config
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                breaker_name: self.config.name.clone(),
                at_ms: now,
                state: self.state,
            });
        match self.state {
            CircuitState::Closed => {
                self.failure_count += 1;
                if self.failure_count >= self.config.failure_threshold {
                    self.transition_to(CircuitState::Open, now);
                }
            }
            CircuitState::HalfOpen => {
                self.transition_to(CircuitState::Open, now);
            }
            CircuitState::Open => {}
        }
    }

    /// Milliseconds until an open circuit will admit a probe; 0 when
    /// not open.
    pub fn retry_after_ms(&self) -> u32 {
        if self.state != CircuitState::Open {
            return 0;
        }
        let now = self.config.clock.now_ms();
        self.config
            .recovery_timeout_ms
            .saturating_sub(elapsed_ms(now, self.last_failure_ms))
    }

    /// Forces the circuit open, e.g. for maintenance.
    pub fn force_open(&mut self) {
        let now = self.config.clock.now_ms();
        self.last_failure_ms = now;
        self.transition_to(CircuitState::Open, now);
    }

    /// Resets the circuit to closed with cleared counters.
    pub fn reset(&mut self) {
        let now = self.config.clock.now_ms();
        self.transition_to(CircuitState::Closed, now);
        self.failure_count = 0;
        self.success_count = 0;
    }

    fn transition_to(&mut self, state: CircuitState, now: u32) {
        if self.state == state {
            return;
        }

        let from_state = self.state;
        self.state = state;
        self.last_state_change_ms = now;
        self.failure_count = 0;
        self.success_count = 0;
        if state == CircuitState::Open {
            self.totals.trips += 1;
        }

        self.config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                breaker_name: self.config.name.clone(),
                at_ms: now,
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(
            breaker = %self.config.name,
            from = ?from_state,
            to = ?state,
            "circuit state transition"
        );

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "picomcp_circuitbreaker_transitions_total",
            "breaker" => self.config.name.clone(),
            "to" => match state {
                CircuitState::Closed => "closed",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
            }
        )
        .increment(1);
    }

    /// Returns a snapshot of counters and state.
    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: self.state,
            failure_count: self.failure_count,
            success_count: self.success_count,
            total_failures: self.totals.failures,
            total_successes: self.totals.successes,
            rejected_count: self.totals.rejected,
            trip_count: self.totals.trips,
        }
    }
}
