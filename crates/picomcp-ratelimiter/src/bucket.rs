use crate::config::RateLimiterConfig;
use crate::events::RateLimiterEvent;
use picomcp_core::elapsed_ms;
use serde::Serialize;

/// Outcome of a token acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allowed,
    /// The request must wait; retry after the given delay.
    Denied {
        /// Recommended wait before retrying, in milliseconds.
        retry_after_ms: u32,
    },
}

impl Decision {
    /// Returns true if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Recommended wait in milliseconds; 0 when allowed.
    pub fn retry_after_ms(&self) -> u32 {
        match self {
            Decision::Allowed => 0,
            Decision::Denied { retry_after_ms } => *retry_after_ms,
        }
    }
}

/// A single token bucket with lazy refill.
///
/// Invariant: `0 <= tokens <= capacity`.
#[derive(Debug, Clone)]
pub(crate) struct TokenBucket {
    pub(crate) tokens: f64,
    pub(crate) capacity: f64,
    pub(crate) refill_per_sec: f64,
    pub(crate) last_refill_ms: u32,
    pub(crate) last_access_ms: u32,
    pub(crate) allowed: u64,
    pub(crate) denied: u64,
}

impl TokenBucket {
    pub(crate) fn new(capacity: f64, refill_per_sec: f64, now_ms: u32) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill_per_sec,
            last_refill_ms: now_ms,
            last_access_ms: now_ms,
            allowed: 0,
            denied: 0,
        }
    }

    /// Adds tokens proportional to the time since the last refill,
    /// clamped to capacity.
    pub(crate) fn refill(&mut self, now_ms: u32) {
        let elapsed = elapsed_ms(now_ms, self.last_refill_ms);
        if elapsed > 0 && self.refill_per_sec > 0.0 {
            let added = f64::from(elapsed) / 1_000.0 * self.refill_per_sec;
            self.tokens = (self.tokens + added).min(self.capacity);
        }
        self.last_refill_ms = now_ms;
    }

    /// Attempts to withdraw `cost` tokens at `now_ms`.
    ///
    /// A non-positive cost always succeeds without mutating the bucket.
    pub(crate) fn try_acquire(&mut self, now_ms: u32, cost: f64) -> Decision {
        if cost <= 0.0 {
            return Decision::Allowed;
        }
        self.refill(now_ms);
        self.last_access_ms = now_ms;
        if self.tokens >= cost {
            self.tokens -= cost;
            self.allowed += 1;
            Decision::Allowed
        } else {
            self.denied += 1;
            Decision::Denied {
                retry_after_ms: self.retry_after_ms(cost),
            }
        }
    }

    /// Milliseconds until `cost` tokens will be available, assuming no
    /// other withdrawals. Returns 0 when the bucket never refills.
    pub(crate) fn retry_after_ms(&self, cost: f64) -> u32 {
        if self.refill_per_sec <= 0.0 {
            return 0;
        }
        let missing = (cost - self.tokens).max(0.0);
        (missing / self.refill_per_sec * 1_000.0).ceil() as u32 + 1
    }

    /// Replaces the rate parameters and refills the bucket to the new
    /// capacity.
    pub(crate) fn reconfigure(&mut self, capacity: f64, refill_per_sec: f64, now_ms: u32) {
        self.capacity = capacity;
        self.refill_per_sec = refill_per_sec;
        self.tokens = capacity;
        self.last_refill_ms = now_ms;
    }
}

/// Point-in-time view of a limiter, serialized as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimiterStats {
    pub tokens: f64,
    pub capacity: f64,
    pub refill_per_sec: f64,
    pub total_allowed: u64,
    pub total_denied: u64,
    pub enabled: bool,
}

/// Rate limiter with one global token bucket.
pub struct RateLimiter {
    config: RateLimiterConfig,
    bucket: TokenBucket,
}

impl RateLimiter {
    pub(crate) fn new(config: RateLimiterConfig) -> Self {
        let now = config.clock.now_ms();
        let bucket = TokenBucket::new(config.capacity, config.refill_per_sec, now);
        Self { config, bucket }
    }

    /// Attempts to withdraw one token.
    pub fn try_acquire_one(&mut self) -> Decision {
        self.try_acquire(1.0)
    }

    /// Attempts to withdraw `cost` tokens.
    ///
    /// A disabled limiter, or a non-positive cost, always allows
    /// without touching the bucket.
    pub fn try_acquire(&mut self, cost: f64) -> Decision {
        if !self.config.enabled {
            return Decision::Allowed;
        }
        let now = self.config.clock.now_ms();
        let decision = self.bucket.try_acquire(now, cost);
        self.emit(&decision, now);
        decision
    }

    fn emit(&self, decision: &Decision, now: u32) {
        match decision {
            Decision::Allowed => {
                self.config.event_listeners.emit(&RateLimiterEvent::Allowed {
                    limiter_name: self.config.name.clone(),
                    at_ms: now,
                    key: None,
                });
                #[cfg(feature = "metrics")]
                metrics::counter!("picomcp_ratelimiter_requests_total", "limiter" => self.config.name.clone(), "outcome" => "allowed").increment(1);
            }
            Decision::Denied { retry_after_ms } => {
                self.config.event_listeners.emit(&RateLimiterEvent::Denied {
                    limiter_name: self.config.name.clone(),
                    at_ms: now,
                    key: None,
                    retry_after_ms: *retry_after_ms,
                });
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    limiter = %self.config.name,
                    retry_after_ms,
                    "request denied by rate limiter"
                );
                #[cfg(feature = "metrics")]
                metrics::counter!("picomcp_ratelimiter_requests_total", "limiter" => self.config.name.clone(), "outcome" => "denied").increment(1);
            }
        }
    }

    /// Replaces the rate parameters. The bucket refills to the new
    /// capacity.
    pub fn set_rate(&mut self, capacity: f64, refill_per_sec: f64) {
        let now = self.config.clock.now_ms();
        self.config.capacity = capacity;
        self.config.refill_per_sec = refill_per_sec;
        self.bucket.reconfigure(capacity, refill_per_sec, now);
    }

    /// Enables or disables the limiter.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Current token balance after a lazy refill.
    pub fn tokens(&mut self) -> f64 {
        let now = self.config.clock.now_ms();
        self.bucket.refill(now);
        self.bucket.tokens
    }

    /// Returns a snapshot of counters and state.
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            tokens: self.bucket.tokens,
            capacity: self.bucket.capacity,
            refill_per_sec: self.bucket.refill_per_sec,
            total_allowed: self.bucket.allowed,
            total_denied: self.bucket.denied,
            enabled: self.config.enabled,
        }
    }
}
