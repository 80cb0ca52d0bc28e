use picomcp_core::{elapsed_ms, SharedClock};
use serde::Serialize;
use thiserror::Error;

/// Maximum entry name length in bytes.
pub const MAX_NAME_LEN: usize = 31;

type TimeoutCallback = Box<dyn FnMut(&str) + Send>;

/// Errors returned when managing watchdog entries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WatchdogError {
    /// The entry table is at capacity.
    #[error("watchdog is full")]
    Full,
    /// An entry already carries this name.
    #[error("watchdog entry {0:?} already exists")]
    DuplicateName(String),
    /// The name exceeds [`MAX_NAME_LEN`] bytes.
    #[error("watchdog entry name too long")]
    NameTooLong,
}

/// Liveness state of a watchdog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// Kicked within its deadline.
    Healthy,
    /// Deadline passed; callbacks have fired for this expiry.
    Expired,
    /// Masked from checking.
    Paused,
}

struct Entry {
    name: String,
    timeout_ms: u32,
    last_kick_ms: u32,
    started: bool,
    state: EntryState,
    timeout_count: u32,
    callback: Option<TimeoutCallback>,
}

/// Point-in-time view of the watchdog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchdogStats {
    pub entry_count: usize,
    pub capacity: usize,
    pub expired_count: usize,
    pub total_timeouts: u64,
}

/// Observes per-task liveness kicks and fires timeout callbacks.
pub struct Watchdog {
    entries: Vec<Entry>,
    capacity: usize,
    clock: SharedClock,
    global_callback: Option<TimeoutCallback>,
    total_timeouts: u64,
}

impl Watchdog {
    /// Creates a watchdog holding at most `capacity` entries.
    pub fn new(capacity: usize, clock: SharedClock) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            clock,
            global_callback: None,
            total_timeouts: 0,
        }
    }

    /// Registers a callback fired after any entry's own callback when
    /// it expires.
    pub fn on_timeout<F>(&mut self, f: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.global_callback = Some(Box::new(f));
    }

    /// Adds an unstarted entry. The first kick arms it.
    pub fn add(
        &mut self,
        name: &str,
        timeout_ms: u32,
        callback: Option<TimeoutCallback>,
    ) -> Result<(), WatchdogError> {
        if name.len() > MAX_NAME_LEN {
            return Err(WatchdogError::NameTooLong);
        }
        if self.entries.iter().any(|e| e.name == name) {
            return Err(WatchdogError::DuplicateName(name.to_string()));
        }
        if self.entries.len() >= self.capacity {
            return Err(WatchdogError::Full);
        }
        self.entries.push(Entry {
            name: name.to_string(),
            timeout_ms,
            last_kick_ms: 0,
            started: false,
            state: EntryState::Healthy,
            timeout_count: 0,
            callback,
        });
        Ok(())
    }

    /// Signals liveness: resets the deadline and forces the entry
    /// healthy (arming it if this is the first kick). Returns false if
    /// the name is unknown.
    pub fn kick(&mut self, name: &str) -> bool {
        let now = self.clock.now_ms();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.last_kick_ms = now;
                entry.started = true;
                entry.state = EntryState::Healthy;
                true
            }
            None => false,
        }
    }

    /// Scans for missed deadlines, firing per-entry then global
    /// callbacks once per expiry. Returns the number of entries that
    /// expired during this check.
    pub fn check(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut fired = 0;
        for index in 0..self.entries.len() {
            let name = {
                let entry = &mut self.entries[index];
                if !entry.started || entry.state != EntryState::Healthy {
                    continue;
                }
                if elapsed_ms(now, entry.last_kick_ms) < entry.timeout_ms {
                    continue;
                }
                entry.state = EntryState::Expired;
                entry.timeout_count += 1;
                #[cfg(feature = "tracing")]
                tracing::warn!(entry = %entry.name, timeout_ms = entry.timeout_ms, "watchdog expired");
                entry.name.clone()
            };
            self.total_timeouts += 1;
            fired += 1;

            if let Some(callback) = self.entries[index].callback.as_mut() {
                callback(&name);
            }
            if let Some(global) = self.global_callback.as_mut() {
                global(&name);
            }
        }
        fired
    }

    /// Masks an entry from checking. Returns false if unknown.
    pub fn pause(&mut self, name: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.state = EntryState::Paused;
                true
            }
            None => false,
        }
    }

    /// Unmasks an entry and re-arms its deadline from the current tick.
    pub fn resume(&mut self, name: &str) -> bool {
        let now = self.clock.now_ms();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.state = EntryState::Healthy;
                entry.last_kick_ms = now;
                true
            }
            None => false,
        }
    }

    /// Removes an entry. Returns false if unknown.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    /// Current state of the named entry.
    pub fn state(&self, name: &str) -> Option<EntryState> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.state)
    }

    /// Expiries recorded for the named entry.
    pub fn timeout_count(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.timeout_count)
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a snapshot of the watchdog.
    pub fn stats(&self) -> WatchdogStats {
        WatchdogStats {
            entry_count: self.entries.len(),
            capacity: self.capacity,
            expired_count: self
                .entries
                .iter()
                .filter(|e| e.state == EntryState::Expired)
                .count(),
            total_timeouts: self.total_timeouts,
        }
    }
}
