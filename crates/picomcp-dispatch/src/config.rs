use crate::dispatcher::Dispatcher;
use picomcp_core::{MonotonicClock, SharedClock, SharedDelay, SharedRng, ThreadDelay, ThreadRng};
use picomcp_retry::RetryPolicy;

/// Tunables for the whole dispatch runtime.
pub struct DispatcherConfig {
    pub(crate) clock: SharedClock,
    pub(crate) rng: SharedRng,
    pub(crate) delay: SharedDelay,

    pub(crate) max_sessions: usize,
    pub(crate) session_idle_timeout_ms: u32,

    pub(crate) rate_capacity: f64,
    pub(crate) rate_refill_per_sec: f64,
    pub(crate) rate_max_keys: usize,

    pub(crate) breaker_failure_threshold: u32,
    pub(crate) breaker_recovery_timeout_ms: u32,
    pub(crate) breaker_half_open_successes: u32,
    pub(crate) max_breakers: usize,

    pub(crate) default_retry_policy: RetryPolicy,

    pub(crate) max_tasks: usize,
    pub(crate) default_task_ttl_ms: i64,

    pub(crate) scheduler_capacity: usize,
    pub(crate) watchdog_capacity: usize,
    pub(crate) store_capacity: usize,
    pub(crate) event_capacity: usize,
    pub(crate) audit_capacity: usize,

    pub(crate) default_role: String,
}

impl DispatcherConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::new()
    }
}

/// Builder for [`DispatcherConfig`]. Defaults are sized for a device
/// with tens of kilobytes of working memory.
pub struct DispatcherConfigBuilder {
    clock: Option<SharedClock>,
    rng: Option<SharedRng>,
    delay: Option<SharedDelay>,
    max_sessions: usize,
    session_idle_timeout_ms: u32,
    rate_capacity: f64,
    rate_refill_per_sec: f64,
    rate_max_keys: usize,
    breaker_failure_threshold: u32,
    breaker_recovery_timeout_ms: u32,
    breaker_half_open_successes: u32,
    max_breakers: usize,
    default_retry_policy: RetryPolicy,
    max_tasks: usize,
    default_task_ttl_ms: i64,
    scheduler_capacity: usize,
    watchdog_capacity: usize,
    store_capacity: usize,
    event_capacity: usize,
    audit_capacity: usize,
    default_role: String,
}

impl DispatcherConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            clock: None,
            rng: None,
            delay: None,
            max_sessions: 8,
            session_idle_timeout_ms: 300_000,
            rate_capacity: 10.0,
            rate_refill_per_sec: 5.0,
            rate_max_keys: 16,
            breaker_failure_threshold: 5,
            breaker_recovery_timeout_ms: 30_000,
            breaker_half_open_successes: 1,
            max_breakers: 16,
            default_retry_policy: RetryPolicy::default(),
            max_tasks: 8,
            default_task_ttl_ms: -1,
            scheduler_capacity: 16,
            watchdog_capacity: 8,
            store_capacity: 32,
            event_capacity: 64,
            audit_capacity: 64,
            default_role: String::from("guest"),
        }
    }

    /// Sets the shared clock driving every component.
    ///
    /// Default: a fresh [`MonotonicClock`]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the entropy source for session ids and retry jitter.
    ///
    /// Default: [`ThreadRng`]
    pub fn rng(mut self, rng: SharedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Sets the retry executor's suspension primitive.
    ///
    /// Default: [`ThreadDelay`]
    pub fn delay(mut self, delay: SharedDelay) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the session cap and idle timeout (0 disables idle expiry).
    ///
    /// Default: 8 sessions, 300 000 ms
    pub fn sessions(mut self, max_sessions: usize, idle_timeout_ms: u32) -> Self {
        self.max_sessions = max_sessions;
        self.session_idle_timeout_ms = idle_timeout_ms;
        self
    }

    /// Sets the per-key token bucket parameters.
    ///
    /// Default: capacity 10.0, refill 5.0/s
    pub fn rate_limit(mut self, capacity: f64, refill_per_sec: f64) -> Self {
        self.rate_capacity = capacity;
        self.rate_refill_per_sec = refill_per_sec;
        self
    }

    /// Sets the keyed rate-bucket pool bound.
    ///
    /// Default: 16
    pub fn rate_max_keys(mut self, max_keys: usize) -> Self {
        self.rate_max_keys = max_keys;
        self
    }

    /// Sets the circuit breaker parameters applied to every tool.
    ///
    /// Default: threshold 5, recovery 30 000 ms, 1 half-open success
    pub fn breaker(
        mut self,
        failure_threshold: u32,
        recovery_timeout_ms: u32,
        half_open_successes: u32,
    ) -> Self {
        self.breaker_failure_threshold = failure_threshold;
        self.breaker_recovery_timeout_ms = recovery_timeout_ms;
        self.breaker_half_open_successes = half_open_successes;
        self
    }

    /// Sets the breaker registry bound.
    ///
    /// Default: 16
    pub fn max_breakers(mut self, max_breakers: usize) -> Self {
        self.max_breakers = max_breakers;
        self
    }

    /// Sets the retry policy used when a tool names none.
    ///
    /// Default: [`RetryPolicy::default`]
    pub fn default_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_retry_policy = policy;
        self
    }

    /// Sets the live-task cap (the pool tolerates twice this many
    /// records before evicting finished tasks).
    ///
    /// Default: 8
    pub fn max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    /// Sets the TTL stamped on created tasks; -1 means unlimited.
    ///
    /// Default: -1
    pub fn default_task_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.default_task_ttl_ms = ttl_ms;
        self
    }

    /// Sets the scheduler and watchdog table sizes.
    ///
    /// Default: 16 scheduled tasks, 8 watchdog entries
    pub fn tick_capacities(mut self, scheduler: usize, watchdog: usize) -> Self {
        self.scheduler_capacity = scheduler;
        self.watchdog_capacity = watchdog;
        self
    }

    /// Sets the state store and log ring capacities.
    ///
    /// Default: 32 store entries, 64 events, 64 audit entries
    pub fn storage_capacities(mut self, store: usize, events: usize, audit: usize) -> Self {
        self.store_capacity = store;
        self.event_capacity = events;
        self.audit_capacity = audit;
        self
    }

    /// Sets the RBAC role assumed for unrecognized callers.
    ///
    /// Default: `guest`
    pub fn default_role(mut self, role: &str) -> Self {
        self.default_role = role.to_string();
        self
    }

    /// Builds the dispatcher with every component wired to the shared
    /// clock.
    pub fn build(self) -> Dispatcher {
        let config = DispatcherConfig {
            clock: self.clock.unwrap_or_else(MonotonicClock::shared),
            rng: self.rng.unwrap_or_else(ThreadRng::shared),
            delay: self.delay.unwrap_or_else(ThreadDelay::shared),
            max_sessions: self.max_sessions,
            session_idle_timeout_ms: self.session_idle_timeout_ms,
            rate_capacity: self.rate_capacity,
            rate_refill_per_sec: self.rate_refill_per_sec,
            rate_max_keys: self.rate_max_keys,
            breaker_failure_threshold: self.breaker_failure_threshold,
            breaker_recovery_timeout_ms: self.breaker_recovery_timeout_ms,
            breaker_half_open_successes: self.breaker_half_open_successes,
            max_breakers: self.max_breakers,
            default_retry_policy: self.default_retry_policy,
            max_tasks: self.max_tasks,
            default_task_ttl_ms: self.default_task_ttl_ms,
            scheduler_capacity: self.scheduler_capacity,
            watchdog_capacity: self.watchdog_capacity,
            store_capacity: self.store_capacity,
            event_capacity: self.event_capacity,
            audit_capacity: self.audit_capacity,
            default_role: self.default_role,
        };
        Dispatcher::new(config)
    }
}

impl Default for DispatcherConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
