use picomcp_core::{reached, EventListener, EventListeners, ListenerId, RuntimeEvent, SharedClock};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by the state store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store is at capacity and the key is new.
    #[error("state store full")]
    Full,
}

/// Change notifications emitted by the store.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A key was written (created or overwritten).
    Set { store_name: String, at_ms: u32, key: String },
    /// A key was removed explicitly.
    Removed { store_name: String, at_ms: u32, key: String },
    /// A key expired past its TTL.
    Expired { store_name: String, at_ms: u32, key: String },
}

impl RuntimeEvent for StoreEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StoreEvent::Set { .. } => "set",
            StoreEvent::Removed { .. } => "removed",
            StoreEvent::Expired { .. } => "expired",
        }
    }

    fn at_ms(&self) -> u32 {
        match self {
            StoreEvent::Set { at_ms, .. }
            | StoreEvent::Removed { at_ms, .. }
            | StoreEvent::Expired { at_ms, .. } => *at_ms,
        }
    }

    fn component(&self) -> &str {
        match self {
            StoreEvent::Set { store_name, .. }
            | StoreEvent::Removed { store_name, .. }
            | StoreEvent::Expired { store_name, .. } => store_name,
        }
    }
}

struct StoreEntry {
    key: String,
    value: Value,
    /// Absolute expiry instant; `None` for no TTL.
    expires_at_ms: Option<u32>,
}

/// Point-in-time view of the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateStoreStats {
    pub entry_count: usize,
    pub capacity: usize,
    pub expired: u64,
}

/// Bounded in-memory K/V store.
pub struct StateStore {
    entries: Vec<StoreEntry>,
    capacity: usize,
    clock: SharedClock,
    listeners: EventListeners<StoreEvent>,
    name: String,
    expired: u64,
}

impl StateStore {
    /// Creates a store holding at most `capacity` entries.
    pub fn new(capacity: usize, clock: SharedClock) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            clock,
            listeners: EventListeners::new(),
            name: String::from("state_store"),
            expired: 0,
        }
    }

    /// Writes a key. `ttl_ms` of 0 means the entry never expires.
    ///
    /// Overwriting an existing key refreshes its TTL. Fails with
    /// [`StoreError::Full`] when the key is new and the store is at
    /// capacity.
    pub fn set(&mut self, key: &str, value: Value, ttl_ms: u32) -> Result<(), StoreError> {
        let now = self.clock.now_ms();
        let expires_at_ms = (ttl_ms > 0).then(|| now.wrapping_add(ttl_ms));
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.value = value;
            entry.expires_at_ms = expires_at_ms;
        } else {
            if self.entries.len() >= self.capacity {
                return Err(StoreError::Full);
            }
            self.entries.push(StoreEntry {
                key: key.to_string(),
                value,
                expires_at_ms,
            });
        }
        self.listeners.emit(&StoreEvent::Set {
            store_name: self.name.clone(),
            at_ms: now,
            key: key.to_string(),
        });
        Ok(())
    }

    /// Reads a key, expiring it lazily if its TTL has passed.
    pub fn get(&mut self, key: &str) -> Option<&Value> {
        let now = self.clock.now_ms();
        let index = self.entries.iter().position(|e| e.key == key)?;
        if let Some(expiry) = self.entries[index].expires_at_ms {
            if reached(now, expiry) {
                let entry = self.entries.swap_remove(index);
                self.expired += 1;
                self.listeners.emit(&StoreEvent::Expired {
                    store_name: self.name.clone(),
                    at_ms: now,
                    key: entry.key,
                });
                return None;
            }
        }
        Some(&self.entries[index].value)
    }

    /// Removes a key explicitly. Returns false if absent.
    pub fn remove(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        match self.entries.iter().position(|e| e.key == key) {
            Some(index) => {
                let entry = self.entries.swap_remove(index);
                self.listeners.emit(&StoreEvent::Removed {
                    store_name: self.name.clone(),
                    at_ms: now,
                    key: entry.key,
                });
                true
            }
            None => false,
        }
    }

    /// Sweeps every expired entry out of the store. Returns the number
    /// removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = Vec::new();
        self.entries.retain(|e| match e.expires_at_ms {
            Some(expiry) if reached(now, expiry) => {
                removed.push(e.key.clone());
                false
            }
            _ => true,
        });
        self.expired += removed.len() as u64;
        #[cfg(feature = "tracing")]
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "purged expired state entries");
        }
        for key in &removed {
            self.listeners.emit(&StoreEvent::Expired {
                store_name: self.name.clone(),
                at_ms: now,
                key: key.clone(),
            });
        }
        removed.len()
    }

    /// Subscribes a change listener, returning its removal handle.
    pub fn subscribe<L>(&mut self, listener: L) -> ListenerId
    where
        L: EventListener<StoreEvent> + 'static,
    {
        self.listeners.add(listener)
    }

    /// Removes a listener by id. Returns false if unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Returns true if the key is present (possibly expired but not
    /// yet swept).
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a snapshot of the store.
    pub fn stats(&self) -> StateStoreStats {
        StateStoreStats {
            entry_count: self.entries.len(),
            capacity: self.capacity,
            expired: self.expired,
        }
    }
}
