use crate::error::RetryError;
use crate::executor::{Outcome, RetryExecutor, RetryStats};
use crate::policy::RetryPolicy;
use picomcp_core::{elapsed_ms, MonotonicClock, SharedClock};
use serde::Serialize;

/// Default bound on the number of named policies.
pub const DEFAULT_MAX_POLICIES: usize = 8;

struct PolicyEntry {
    name: String,
    policy: RetryPolicy,
    stats: RetryStats,
    last_access_ms: u32,
}

/// Per-policy counters, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatsSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub stats: RetryStats,
}

/// Named retry policies with accumulated per-policy statistics.
///
/// The pool is bounded with the same least-recently-accessed eviction
/// as the other picomcp registries.
pub struct PolicyRegistry {
    entries: Vec<PolicyEntry>,
    max_policies: usize,
    clock: SharedClock,
    evictions: u64,
}

impl PolicyRegistry {
    /// Creates a registry bounded at [`DEFAULT_MAX_POLICIES`].
    pub fn new(clock: SharedClock) -> Self {
        Self::with_capacity(clock, DEFAULT_MAX_POLICIES)
    }

    /// Creates a registry with an explicit pool bound.
    pub fn with_capacity(clock: SharedClock, max_policies: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_policies: max_policies.max(1),
            clock,
            evictions: 0,
        }
    }

    /// Creates a registry with a private monotonic clock.
    pub fn with_default_clock() -> Self {
        Self::new(MonotonicClock::shared())
    }

    /// Registers (or replaces) a named policy.
    pub fn register(&mut self, name: &str, policy: RetryPolicy) {
        let now = self.clock.now_ms();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.policy = policy;
            entry.last_access_ms = now;
            return;
        }
        self.evict_if_full(now);
        self.entries.push(PolicyEntry {
            name: name.to_string(),
            policy,
            stats: RetryStats::default(),
            last_access_ms: now,
        });
    }

    /// Returns the registered policy for `name`, if any.
    pub fn policy(&self, name: &str) -> Option<&RetryPolicy> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.policy)
    }

    /// Executes `op` under the policy registered for `name`, falling
    /// back to `default` (and registering it under `name`) when absent.
    /// The run's statistics are merged into the named entry.
    pub fn execute<T, F>(
        &mut self,
        name: &str,
        executor: &mut RetryExecutor,
        default: &RetryPolicy,
        op: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Outcome<T>,
    {
        let now = self.clock.now_ms();
        let index = match self.entries.iter().position(|e| e.name == name) {
            Some(index) => index,
            None => {
                self.evict_if_full(now);
                self.entries.push(PolicyEntry {
                    name: name.to_string(),
                    policy: default.clone(),
                    stats: RetryStats::default(),
                    last_access_ms: now,
                });
                self.entries.len() - 1
            }
        };
        let policy = self.entries[index].policy.clone();

        let before = executor.stats().clone();
        let result = executor.execute(&policy, op);
        let delta = executor.stats().diff(&before);

        let entry = &mut self.entries[index];
        entry.stats.merge(&delta);
        entry.last_access_ms = self.clock.now_ms();
        result
    }

    fn evict_if_full(&mut self, now: u32) {
        if self.entries.len() < self.max_policies {
            return;
        }
        let victim = self
            .entries
            .iter()
            .enumerate()
            .max_by_key(|(_, e)| elapsed_ms(now, e.last_access_ms))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let evicted = self.entries.swap_remove(victim);
        self.evictions += 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(policy = %evicted.name, "evicted retry policy");
        #[cfg(not(feature = "tracing"))]
        drop(evicted);
    }

    /// Number of registered policies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no policies are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total evictions since construction.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Returns per-policy counter snapshots.
    pub fn stats(&self) -> Vec<PolicyStatsSnapshot> {
        self.entries
            .iter()
            .map(|e| PolicyStatsSnapshot {
                name: e.name.clone(),
                stats: e.stats.clone(),
            })
            .collect()
    }
}
