use picomcp_core::{elapsed_ms, SharedClock, SharedRng};
use serde::Serialize;
use std::fmt::Write as _;
use thiserror::Error;

/// Errors returned by the session manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Every slot is held by a session that is actively in use.
    #[error("session pool full; all sessions active")]
    PoolFull,
}

/// A connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// 32 lowercase hex characters.
    pub id: String,
    pub client_name: String,
    pub created_at: u32,
    pub last_activity: u32,
    pub initialized: bool,
}

/// Point-in-time view of the session pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionManagerStats {
    pub active_sessions: usize,
    pub max_sessions: usize,
    pub created: u64,
    pub expired: u64,
    pub evicted: u64,
}

/// Owns the bounded set of live sessions.
pub struct SessionManager {
    sessions: Vec<Session>,
    max_sessions: usize,
    /// Idle cutoff in milliseconds; 0 disables pruning.
    idle_timeout_ms: u32,
    clock: SharedClock,
    rng: SharedRng,
    created: u64,
    expired: u64,
    evicted: u64,
}

impl SessionManager {
    /// Creates a manager bounded at `max_sessions` with the given idle
    /// timeout (0 disables idle expiry).
    pub fn new(max_sessions: usize, idle_timeout_ms: u32, clock: SharedClock, rng: SharedRng) -> Self {
        Self {
            sessions: Vec::new(),
            max_sessions: max_sessions.max(1),
            idle_timeout_ms,
            clock,
            rng,
            created: 0,
            expired: 0,
            evicted: 0,
        }
    }

    /// Creates a session and returns its id.
    ///
    /// On a full set, expired sessions are pruned first; if still full,
    /// the most idle session is evicted. Fails only when every session
    /// is active at this very instant.
    pub fn create(&mut self, client_name: &str) -> Result<String, SessionError> {
        let now = self.clock.now_ms();
        if self.sessions.len() >= self.max_sessions {
            self.prune();
        }
        if self.sessions.len() >= self.max_sessions {
            let (victim, idle) = self
                .sessions
                .iter()
                .enumerate()
                .map(|(i, s)| (i, elapsed_ms(now, s.last_activity)))
                .max_by_key(|(_, idle)| *idle)
                .unwrap_or((0, 0));
            if idle == 0 {
                return Err(SessionError::PoolFull);
            }
            let evicted = self.sessions.swap_remove(victim);
            self.evicted += 1;
            #[cfg(feature = "tracing")]
            tracing::debug!(session = %evicted.id, idle_ms = idle, "evicted idle session");
            #[cfg(not(feature = "tracing"))]
            drop(evicted);
        }

        let id = self.generate_id();
        self.sessions.push(Session {
            id: id.clone(),
            client_name: client_name.to_string(),
            created_at: now,
            last_activity: now,
            initialized: false,
        });
        self.created += 1;
        Ok(id)
    }

    /// Validates a session id, touching its activity timestamp on hit.
    pub fn validate(&mut self, id: &str) -> bool {
        let now = self.clock.now_ms();
        let Some(index) = self.sessions.iter().position(|s| s.id == id) else {
            return false;
        };
        if self.idle_timeout_ms > 0
            && elapsed_ms(now, self.sessions[index].last_activity) > self.idle_timeout_ms
        {
            // Expired but not yet pruned; treat as gone.
            self.sessions.swap_remove(index);
            self.expired += 1;
            return false;
        }
        self.sessions[index].last_activity = now;
        true
    }

    /// Marks a session as having completed the initialize handshake.
    pub fn mark_initialized(&mut self, id: &str) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                session.initialized = true;
                true
            }
            None => false,
        }
    }

    /// Ends a session explicitly.
    pub fn end(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        self.sessions.len() != before
    }

    /// Removes every session idle longer than the timeout. Returns the
    /// number removed; a timeout of 0 disables pruning.
    pub fn prune(&mut self) -> usize {
        if self.idle_timeout_ms == 0 {
            return 0;
        }
        let now = self.clock.now_ms();
        let timeout = self.idle_timeout_ms;
        let before = self.sessions.len();
        self.sessions
            .retain(|s| elapsed_ms(now, s.last_activity) <= timeout);
        let removed = before - self.sessions.len();
        self.expired += removed as u64;
        #[cfg(feature = "tracing")]
        if removed > 0 {
            tracing::debug!(removed, "pruned idle sessions");
        }
        removed
    }

    /// Returns the session with the given id.
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Returns a snapshot of the pool.
    pub fn stats(&self) -> SessionManagerStats {
        SessionManagerStats {
            active_sessions: self.sessions.len(),
            max_sessions: self.max_sessions,
            created: self.created,
            expired: self.expired,
            evicted: self.evicted,
        }
    }

    /// 16 bytes of entropy rendered as 32 lowercase hex characters.
    ///
    /// Uniqueness is statistical; collisions are not checked.
    fn generate_id(&self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        let mut id = String::with_capacity(32);
        for byte in bytes {
            let _ = write!(id, "{byte:02x}");
        }
        id
    }
}
