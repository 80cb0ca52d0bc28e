use crate::ring::RingBuffer;
use picomcp_core::{EventListener, EventListeners, ListenerId, RuntimeEvent, SharedClock};
use serde::Serialize;

/// Category of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ToolCall,
    AccessDenied,
    AuthSuccess,
    AuthFailure,
    SessionStart,
    SessionEnd,
    RoleChange,
    Custom,
}

/// One audited action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Monotonic sequence number, unique per log instance.
    pub seq: u32,
    pub ts_ms: u32,
    pub action: AuditAction,
    /// Who acted (api key, session id, or "anonymous").
    pub actor: String,
    /// What was acted upon (tool name, session id).
    pub target: String,
    pub detail: String,
    pub success: bool,
}

impl RuntimeEvent for AuditEntry {
    fn event_type(&self) -> &'static str {
        "audit_appended"
    }

    fn at_ms(&self) -> u32 {
        self.ts_ms
    }

    fn component(&self) -> &str {
        &self.target
    }
}

/// Point-in-time view of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogStats {
    pub entry_count: usize,
    pub capacity: usize,
    pub next_seq: u32,
    pub dropped: u64,
}

/// Fixed-capacity audit trail with the same sequence discipline as the
/// event store.
pub struct AuditLog {
    ring: RingBuffer<AuditEntry>,
    next_seq: u32,
    dropped: u64,
    clock: SharedClock,
    listeners: EventListeners<AuditEntry>,
}

impl AuditLog {
    /// Creates a log holding at most `capacity` entries.
    pub fn new(capacity: usize, clock: SharedClock) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
            next_seq: 1,
            dropped: 0,
            clock,
            listeners: EventListeners::new(),
        }
    }

    /// Appends an entry and returns its sequence number.
    pub fn append(
        &mut self,
        action: AuditAction,
        actor: &str,
        target: &str,
        detail: &str,
        success: bool,
    ) -> u32 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        let entry = AuditEntry {
            seq,
            ts_ms: self.clock.now_ms(),
            action,
            actor: actor.to_string(),
            target: target.to_string(),
            detail: detail.to_string(),
            success,
        };
        self.listeners.emit(&entry);
        if self.ring.push(entry).is_some() {
            self.dropped += 1;
        }
        seq
    }

    /// Subscribes an append listener, returning its removal handle.
    pub fn subscribe<L>(&mut self, listener: L) -> ListenerId
    where
        L: EventListener<AuditEntry> + 'static,
    {
        self.listeners.add(listener)
    }

    /// Removes a listener by id. Returns false if unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Every stored entry with the given action, oldest first.
    pub fn by_action(&self, action: AuditAction) -> Vec<&AuditEntry> {
        self.ring.iter().filter(|e| e.action == action).collect()
    }

    /// Every stored entry by the given actor.
    pub fn by_actor(&self, actor: &str) -> Vec<&AuditEntry> {
        self.ring.iter().filter(|e| e.actor == actor).collect()
    }

    /// Every stored entry touching the given target.
    pub fn by_target(&self, target: &str) -> Vec<&AuditEntry> {
        self.ring.iter().filter(|e| e.target == target).collect()
    }

    /// The newest `n` entries, oldest first.
    pub fn last(&self, n: usize) -> Vec<&AuditEntry> {
        let skip = self.ring.len().saturating_sub(n);
        self.ring.iter().skip(skip).collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Drops every stored entry; the sequence keeps running.
    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// Drops every stored entry and rewinds the sequence.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.next_seq = 1;
        self.dropped = 0;
    }

    /// Returns a snapshot of the log.
    pub fn stats(&self) -> AuditLogStats {
        AuditLogStats {
            entry_count: self.ring.len(),
            capacity: self.ring.capacity(),
            next_seq: self.next_seq,
            dropped: self.dropped,
        }
    }
}
