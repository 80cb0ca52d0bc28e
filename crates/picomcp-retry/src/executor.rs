use crate::error::{RetryError, RetryableError};
use crate::events::RetryEvent;
use crate::policy::RetryPolicy;
use picomcp_core::{
    elapsed_ms, EventListeners, FnListener, MonotonicClock, SharedClock, SharedDelay, SharedRng,
    ThreadDelay, ThreadRng,
};
use serde::Serialize;

/// Outcome of a single operation attempt, classified by the operation
/// itself.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The operation succeeded.
    Success(T),
    /// The operation failed transiently; the executor may retry.
    Retryable(RetryableError),
    /// The operation failed permanently; the executor must not retry.
    Fatal(RetryableError),
}

/// Cumulative retry counters, serialized as a flat JSON object.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryStats {
    /// Operation invocations, including ones cut off by the budget.
    pub attempts: u64,
    pub successes: u64,
    pub retries: u64,
    /// Executions that exhausted every retry.
    pub failures: u64,
    pub fatal_errors: u64,
    pub timeouts: u64,
    pub total_delay_ms: u64,
}

impl RetryStats {
    /// Adds `delta` into these counters.
    pub fn merge(&mut self, delta: &RetryStats) {
        self.attempts += delta.attempts;
        self.successes += delta.successes;
        self.retries += delta.retries;
        self.failures += delta.failures;
        self.fatal_errors += delta.fatal_errors;
        self.timeouts += delta.timeouts;
        self.total_delay_ms += delta.total_delay_ms;
    }

    /// Counter-wise difference `self - earlier`.
    pub fn diff(&self, earlier: &RetryStats) -> RetryStats {
        RetryStats {
            attempts: self.attempts - earlier.attempts,
            successes: self.successes - earlier.successes,
            retries: self.retries - earlier.retries,
            failures: self.failures - earlier.failures,
            fatal_errors: self.fatal_errors - earlier.fatal_errors,
            timeouts: self.timeouts - earlier.timeouts,
            total_delay_ms: self.total_delay_ms - earlier.total_delay_ms,
        }
    }
}

/// Runs operations under a [`RetryPolicy`], suspending between attempts
/// through the injected delay primitive.
pub struct RetryExecutor {
    clock: SharedClock,
    delay: SharedDelay,
    rng: SharedRng,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
    stats: RetryStats,
}

impl RetryExecutor {
    /// Creates a new executor builder.
    pub fn builder() -> RetryExecutorBuilder {
        RetryExecutorBuilder::new()
    }

    /// Executes `op` under `policy`.
    ///
    /// `op` receives the 0-based attempt number. The total timeout is
    /// checked between attempts, never mid-operation; the final backoff
    /// before the budget line is clamped to the remaining budget so the
    /// timeout is detected promptly.
    pub fn execute<T, F>(&mut self, policy: &RetryPolicy, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Outcome<T>,
    {
        let start = self.clock.now_ms();
        let mut last_delay = 0u32;
        let mut attempt = 0u32;

        loop {
            self.stats.attempts += 1;

            if attempt > 0 && policy.total_timeout_ms > 0 {
                let elapsed = elapsed_ms(self.clock.now_ms(), start);
                if elapsed >= policy.total_timeout_ms {
                    self.stats.timeouts += 1;
                    self.event_listeners.emit(&RetryEvent::TimedOut {
                        executor_name: self.name.clone(),
                        at_ms: self.clock.now_ms(),
                        elapsed_ms: elapsed,
                    });
                    #[cfg(feature = "tracing")]
                    tracing::warn!(executor = %self.name, elapsed, "retry budget exceeded");
                    #[cfg(feature = "metrics")]
                    metrics::counter!("picomcp_retry_timeouts_total", "executor" => self.name.clone()).increment(1);
                    return Err(RetryError::TimedOut {
                        elapsed_ms: elapsed,
                    });
                }
            }

            match op(attempt) {
                Outcome::Success(value) => {
                    self.stats.successes += 1;
                    self.event_listeners.emit(&RetryEvent::Succeeded {
                        executor_name: self.name.clone(),
                        at_ms: self.clock.now_ms(),
                        attempts: attempt + 1,
                    });
                    return Ok(value);
                }
                Outcome::Fatal(error) => {
                    self.stats.fatal_errors += 1;
                    self.event_listeners.emit(&RetryEvent::FatalError {
                        executor_name: self.name.clone(),
                        at_ms: self.clock.now_ms(),
                        attempt,
                    });
                    #[cfg(feature = "tracing")]
                    tracing::debug!(executor = %self.name, %error, "fatal error, not retrying");
                    return Err(RetryError::Fatal(error));
                }
                Outcome::Retryable(error) => {
                    if attempt == policy.max_retries {
                        self.stats.failures += 1;
                        self.event_listeners.emit(&RetryEvent::GaveUp {
                            executor_name: self.name.clone(),
                            at_ms: self.clock.now_ms(),
                            attempts: attempt + 1,
                        });
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            executor = %self.name,
                            attempts = attempt + 1,
                            %error,
                            "giving up after exhausting retries"
                        );
                        #[cfg(feature = "metrics")]
                        metrics::counter!("picomcp_retry_exhausted_total", "executor" => self.name.clone()).increment(1);
                        return Err(RetryError::Exhausted(error));
                    }

                    let mut delay = policy.delay_for_attempt(attempt, last_delay, &*self.rng);
                    if policy.total_timeout_ms > 0 {
                        let elapsed = elapsed_ms(self.clock.now_ms(), start);
                        delay = delay.min(policy.total_timeout_ms.saturating_sub(elapsed));
                    }

                    self.stats.retries += 1;
                    self.stats.total_delay_ms += u64::from(delay);
                    self.event_listeners.emit(&RetryEvent::RetryScheduled {
                        executor_name: self.name.clone(),
                        at_ms: self.clock.now_ms(),
                        attempt: attempt + 1,
                        delay_ms: delay,
                    });
                    #[cfg(feature = "metrics")]
                    metrics::counter!("picomcp_retry_retries_total", "executor" => self.name.clone()).increment(1);

                    self.delay.sleep_ms(delay);
                    last_delay = delay;
                    attempt += 1;
                }
            }
        }
    }

    /// Cumulative counters across all executions.
    pub fn stats(&self) -> &RetryStats {
        &self.stats
    }
}

/// Builder for [`RetryExecutor`].
pub struct RetryExecutorBuilder {
    clock: Option<SharedClock>,
    delay: Option<SharedDelay>,
    rng: Option<SharedRng>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl RetryExecutorBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            clock: None,
            delay: None,
            rng: None,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the clock used for the total-timeout budget.
    ///
    /// Default: a fresh [`MonotonicClock`]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the suspension primitive used between attempts.
    ///
    /// Default: [`ThreadDelay`]
    pub fn delay(mut self, delay: SharedDelay) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the randomness source for jitter.
    ///
    /// Default: [`ThreadRng`]
    pub fn rng(mut self, rng: SharedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Give this executor a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Register a callback fired before each backoff sleep.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &RetryEvent| {
                if let RetryEvent::RetryScheduled {
                    attempt, delay_ms, ..
                } = event
                {
                    f(*attempt, *delay_ms);
                }
            }));
        self
    }

    /// Register a callback fired when every retry is exhausted.
    pub fn on_give_up<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &RetryEvent| {
                if let RetryEvent::GaveUp { attempts, .. } = event {
                    f(*attempts);
                }
            }));
        self
    }

    /// Builds the executor.
    pub fn build(self) -> RetryExecutor {
        RetryExecutor {
            clock: self.clock.unwrap_or_else(MonotonicClock::shared),
            delay: self.delay.unwrap_or_else(ThreadDelay::shared),
            rng: self.rng.unwrap_or_else(ThreadRng::shared),
            event_listeners: self.event_listeners,
            name: self.name,
            stats: RetryStats::default(),
        }
    }
}

impl Default for RetryExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
