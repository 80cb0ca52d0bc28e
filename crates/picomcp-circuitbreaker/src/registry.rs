use crate::breaker::{CircuitBreaker, CircuitBreakerStats, CircuitState};
use crate::config::CircuitBreakerConfig;
use picomcp_core::elapsed_ms;
use serde::Serialize;

/// Default bound on the number of live breakers.
pub const DEFAULT_MAX_BREAKERS: usize = 16;

/// Point-in-time view of the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub breaker_count: usize,
    pub max_breakers: usize,
    pub open_count: usize,
    pub evictions: u64,
}

/// Named circuit breakers in a bounded pool with LRU eviction.
///
/// New breakers are stamped from a shared template configuration, so a
/// state-change listener registered on the template propagates to every
/// breaker the registry creates.
pub struct CircuitBreakerRegistry {
    template: CircuitBreakerConfig,
    breakers: Vec<CircuitBreaker>,
    max_breakers: usize,
    evictions: u64,
}

impl CircuitBreakerRegistry {
    /// Creates a registry stamping breakers from `template`, bounded at
    /// [`DEFAULT_MAX_BREAKERS`].
    pub fn new(template: CircuitBreakerConfig) -> Self {
        Self::with_capacity(template, DEFAULT_MAX_BREAKERS)
    }

    /// Creates a registry with an explicit pool bound.
    pub fn with_capacity(template: CircuitBreakerConfig, max_breakers: usize) -> Self {
        Self {
            template,
            breakers: Vec::new(),
            max_breakers: max_breakers.max(1),
            evictions: 0,
        }
    }

    /// Returns the breaker for `name`, creating it if absent and
    /// evicting the least-recently-accessed breaker when full.
    pub fn get_or_insert(&mut self, name: &str) -> &mut CircuitBreaker {
        if let Some(index) = self.breakers.iter().position(|b| b.name() == name) {
            return &mut self.breakers[index];
        }

        if self.breakers.len() >= self.max_breakers {
            let now = self.template.clock.now_ms();
            let victim = self
                .breakers
                .iter()
                .enumerate()
                .max_by_key(|(_, b)| elapsed_ms(now, b.last_access_ms))
                .map(|(i, _)| i)
                .unwrap_or(0);
            let evicted = self.breakers.swap_remove(victim);
            self.evictions += 1;
            #[cfg(feature = "tracing")]
            tracing::debug!(breaker = %evicted.name(), "evicted circuit breaker");
            #[cfg(not(feature = "tracing"))]
            drop(evicted);
        }

        self.breakers
            .push(CircuitBreaker::new(self.template.with_name(name)));
        let index = self.breakers.len() - 1;
        &mut self.breakers[index]
    }

    /// Returns the breaker for `name` without creating it.
    pub fn get(&mut self, name: &str) -> Option<&mut CircuitBreaker> {
        self.breakers.iter_mut().find(|b| b.name() == name)
    }

    /// Number of live breakers.
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Returns true when no breakers exist yet.
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Resets every breaker to closed.
    pub fn reset_all(&mut self) {
        for breaker in &mut self.breakers {
            breaker.reset();
        }
    }

    /// Returns a snapshot of the registry.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            breaker_count: self.breakers.len(),
            max_breakers: self.max_breakers,
            open_count: self
                .breakers
                .iter()
                .filter(|b| b.state() == CircuitState::Open)
                .count(),
            evictions: self.evictions,
        }
    }

    /// Returns per-breaker snapshots, for diagnostics.
    pub fn breaker_stats(&self) -> Vec<(String, CircuitBreakerStats)> {
        self.breakers
            .iter()
            .map(|b| (b.name().to_string(), b.stats()))
            .collect()
    }
}
