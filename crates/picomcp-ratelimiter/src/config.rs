use crate::events::RateLimiterEvent;
use crate::keyed::KeyedRateLimiter;
use crate::RateLimiter;
use picomcp_core::{EventListeners, FnListener, MonotonicClock, SharedClock};

/// Configuration shared by the global and keyed rate limiters.
pub struct RateLimiterConfig {
    pub(crate) capacity: f64,
    pub(crate) refill_per_sec: f64,
    pub(crate) enabled: bool,
    pub(crate) max_keys: usize,
    pub(crate) clock: SharedClock,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

impl RateLimiterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }
}

/// Builder for configuring and constructing a rate limiter.
pub struct RateLimiterConfigBuilder {
    capacity: f64,
    refill_per_sec: f64,
    enabled: bool,
    max_keys: usize,
    clock: Option<SharedClock>,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
}

impl RateLimiterConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            capacity: 10.0,
            refill_per_sec: 5.0,
            enabled: true,
            max_keys: 16,
            clock: None,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the burst capacity of each bucket, in tokens.
    ///
    /// Default: 10.0
    pub fn capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the steady refill rate, in tokens per second.
    ///
    /// Default: 5.0
    pub fn refill_per_sec(mut self, rate: f64) -> Self {
        self.refill_per_sec = rate;
        self
    }

    /// Enables or disables the limiter. A disabled limiter always
    /// allows without touching bucket state.
    ///
    /// Default: enabled
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the bucket-pool capacity of the keyed variant. When full,
    /// the least-recently-accessed bucket is evicted.
    ///
    /// Default: 16
    pub fn max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Sets the clock the limiter reads for lazy refills.
    ///
    /// Default: a fresh [`MonotonicClock`]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Give this limiter a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Register a callback for denied requests.
    pub fn on_denied<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&str>, u32) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &RateLimiterEvent| {
                if let RateLimiterEvent::Denied {
                    key,
                    retry_after_ms,
                    ..
                } = event
                {
                    f(key.as_deref(), *retry_after_ms);
                }
            }));
        self
    }

    /// Register a callback for keyed-pool evictions.
    pub fn on_evicted<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &RateLimiterEvent| {
                if let RateLimiterEvent::KeyEvicted { key, .. } = event {
                    f(key);
                }
            }));
        self
    }

    fn into_config(self) -> RateLimiterConfig {
        RateLimiterConfig {
            capacity: self.capacity,
            refill_per_sec: self.refill_per_sec,
            enabled: self.enabled,
            max_keys: self.max_keys.max(1),
            clock: self.clock.unwrap_or_else(MonotonicClock::shared),
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds a single global-bucket limiter.
    pub fn build(self) -> RateLimiter {
        RateLimiter::new(self.into_config())
    }

    /// Builds a keyed limiter with a bounded bucket pool.
    pub fn build_keyed(self) -> KeyedRateLimiter {
        KeyedRateLimiter::new(self.into_config())
    }
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
