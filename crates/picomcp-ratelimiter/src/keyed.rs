use crate::bucket::{Decision, TokenBucket};
use crate::config::RateLimiterConfig;
use crate::events::RateLimiterEvent;
use picomcp_core::elapsed_ms;
use serde::Serialize;

/// Maximum stored key length in bytes. Longer keys are truncated, the
/// way a fixed key buffer would.
const MAX_KEY_LEN: usize = 31;

struct KeyedBucket {
    key: String,
    bucket: TokenBucket,
}

/// Point-in-time view of the keyed pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedRateLimiterStats {
    pub active_keys: usize,
    pub max_keys: usize,
    pub evictions: u64,
    pub total_allowed: u64,
    pub total_denied: u64,
    pub enabled: bool,
}

/// Rate limiter with one bucket per key and a bounded pool.
///
/// Lookup is a linear scan: keys are short and the pool is small, so
/// scanning beats hashing at this scale. When the pool is full, the
/// bucket with the smallest `last_access_ms` is evicted.
pub struct KeyedRateLimiter {
    config: RateLimiterConfig,
    entries: Vec<KeyedBucket>,
    evictions: u64,
}

impl KeyedRateLimiter {
    pub(crate) fn new(config: RateLimiterConfig) -> Self {
        let entries = Vec::with_capacity(config.max_keys);
        Self {
            config,
            entries,
            evictions: 0,
        }
    }

    /// Attempts to withdraw one token from the bucket for `key`.
    pub fn try_acquire_one(&mut self, key: &str) -> Decision {
        self.try_acquire(key, 1.0)
    }

    /// Attempts to withdraw `cost` tokens from the bucket for `key`.
    ///
    /// Creates the bucket on first sight, evicting the
    /// least-recently-accessed entry if the pool is full.
    pub fn try_acquire(&mut self, key: &str, cost: f64) -> Decision {
        if !self.config.enabled {
            return Decision::Allowed;
        }
        if cost <= 0.0 {
            return Decision::Allowed;
        }
        let key = clip_key(key);
        let now = self.config.clock.now_ms();

        let index = match self.entries.iter().position(|e| e.key == key) {
            Some(index) => index,
            None => self.insert(key, now),
        };
        let decision = self.entries[index].bucket.try_acquire(now, cost);
        self.emit(&decision, &self.entries[index].key, now);
        decision
    }

    fn insert(&mut self, key: &str, now: u32) -> usize {
        if self.entries.len() >= self.config.max_keys {
            let victim = self
                .entries
                .iter()
                .enumerate()
                .max_by_key(|(_, e)| elapsed_ms(now, e.bucket.last_access_ms))
                .map(|(i, _)| i)
                .unwrap_or(0);
            let evicted = self.entries.swap_remove(victim);
            self.evictions += 1;
            self.config
                .event_listeners
                .emit(&RateLimiterEvent::KeyEvicted {
                    limiter_name: self.config.name.clone(),
                    at_ms: now,
                    key: evicted.key.clone(),
                });
            #[cfg(feature = "tracing")]
            tracing::debug!(
                limiter = %self.config.name,
                key = %evicted.key,
                "evicted rate bucket"
            );
            #[cfg(feature = "metrics")]
            metrics::counter!("picomcp_ratelimiter_evictions_total", "limiter" => self.config.name.clone()).increment(1);
        }
        self.entries.push(KeyedBucket {
            key: key.to_string(),
            bucket: TokenBucket::new(self.config.capacity, self.config.refill_per_sec, now),
        });
        self.entries.len() - 1
    }

    fn emit(&self, decision: &Decision, key: &str, now: u32) {
        match decision {
            Decision::Allowed => {
                self.config.event_listeners.emit(&RateLimiterEvent::Allowed {
                    limiter_name: self.config.name.clone(),
                    at_ms: now,
                    key: Some(key.to_string()),
                });
            }
            Decision::Denied { retry_after_ms } => {
                self.config.event_listeners.emit(&RateLimiterEvent::Denied {
                    limiter_name: self.config.name.clone(),
                    at_ms: now,
                    key: Some(key.to_string()),
                    retry_after_ms: *retry_after_ms,
                });
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    limiter = %self.config.name,
                    key,
                    retry_after_ms,
                    "request denied by keyed rate limiter"
                );
            }
        }
    }

    /// Replaces the rate parameters. Every existing bucket refills to
    /// the new capacity; entries are not purged.
    pub fn set_rate(&mut self, capacity: f64, refill_per_sec: f64) {
        let now = self.config.clock.now_ms();
        self.config.capacity = capacity;
        self.config.refill_per_sec = refill_per_sec;
        for entry in &mut self.entries {
            entry.bucket.reconfigure(capacity, refill_per_sec, now);
        }
    }

    /// Enables or disables the limiter.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Number of live buckets.
    pub fn active_keys(&self) -> usize {
        self.entries.len()
    }

    /// Total evictions since construction.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Returns a snapshot of counters and state.
    pub fn stats(&self) -> KeyedRateLimiterStats {
        let (allowed, denied) = self
            .entries
            .iter()
            .fold((0, 0), |(a, d), e| (a + e.bucket.allowed, d + e.bucket.denied));
        KeyedRateLimiterStats {
            active_keys: self.entries.len(),
            max_keys: self.config.max_keys,
            evictions: self.evictions,
            total_allowed: allowed,
            total_denied: denied,
            enabled: self.config.enabled,
        }
    }
}

fn clip_key(key: &str) -> &str {
    if key.len() <= MAX_KEY_LEN {
        return key;
    }
    let mut end = MAX_KEY_LEN;
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    &key[..end]
}
