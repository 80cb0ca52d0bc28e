use crate::ring::RingBuffer;
use picomcp_core::{
    reached, EventListener, EventListeners, ListenerId, RuntimeEvent, SharedClock,
};
use serde::Serialize;

/// Severity of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// A structured event record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Monotonic sequence number, unique per store instance.
    pub seq: u32,
    pub ts_ms: u32,
    pub tag: String,
    pub payload: String,
    pub severity: Severity,
}

impl RuntimeEvent for EventRecord {
    fn event_type(&self) -> &'static str {
        "event_appended"
    }

    fn at_ms(&self) -> u32 {
        self.ts_ms
    }

    fn component(&self) -> &str {
        &self.tag
    }
}

/// Point-in-time view of the event store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStoreStats {
    pub event_count: usize,
    pub capacity: usize,
    pub next_seq: u32,
    pub dropped: u64,
}

/// Fixed-capacity store of structured events.
///
/// The sequence number survives eviction and [`clear`](Self::clear);
/// only [`reset`](Self::reset) rewinds it.
pub struct EventStore {
    ring: RingBuffer<EventRecord>,
    next_seq: u32,
    dropped: u64,
    clock: SharedClock,
    listeners: EventListeners<EventRecord>,
}

impl EventStore {
    /// Creates a store holding at most `capacity` events.
    pub fn new(capacity: usize, clock: SharedClock) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
            next_seq: 1,
            dropped: 0,
            clock,
            listeners: EventListeners::new(),
        }
    }

    /// Appends an event and returns its sequence number.
    pub fn emit(&mut self, tag: &str, payload: &str, severity: Severity) -> u32 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        let record = EventRecord {
            seq,
            ts_ms: self.clock.now_ms(),
            tag: tag.to_string(),
            payload: payload.to_string(),
            severity,
        };
        self.listeners.emit(&record);
        if self.ring.push(record).is_some() {
            self.dropped += 1;
        }
        seq
    }

    /// Subscribes an append listener, returning its removal handle.
    pub fn subscribe<L>(&mut self, listener: L) -> ListenerId
    where
        L: EventListener<EventRecord> + 'static,
    {
        self.listeners.add(listener)
    }

    /// Removes a listener by id. Returns false if unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Every stored event with the given tag, oldest first.
    pub fn by_tag(&self, tag: &str) -> Vec<&EventRecord> {
        self.ring.iter().filter(|e| e.tag == tag).collect()
    }

    /// Every stored event stamped at or after `ts_ms`.
    pub fn since_ts(&self, ts_ms: u32) -> Vec<&EventRecord> {
        self.ring
            .iter()
            .filter(|e| reached(e.ts_ms, ts_ms))
            .collect()
    }

    /// Every stored event with a sequence number greater than `seq`.
    pub fn since_seq(&self, seq: u32) -> Vec<&EventRecord> {
        self.ring.iter().filter(|e| e.seq > seq).collect()
    }

    /// Every stored event at or above the given severity.
    pub fn min_severity(&self, severity: Severity) -> Vec<&EventRecord> {
        self.ring.iter().filter(|e| e.severity >= severity).collect()
    }

    /// The newest `n` events, oldest first.
    pub fn last(&self, n: usize) -> Vec<&EventRecord> {
        let skip = self.ring.len().saturating_sub(n);
        self.ring.iter().skip(skip).collect()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true when no events are stored.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Drops every stored event; the sequence keeps running.
    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// Drops every stored event and rewinds the sequence.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.next_seq = 1;
        self.dropped = 0;
    }

    /// Returns a snapshot of the store.
    pub fn stats(&self) -> EventStoreStats {
        EventStoreStats {
            event_count: self.ring.len(),
            capacity: self.ring.capacity(),
            next_seq: self.next_seq,
            dropped: self.dropped,
        }
    }
}
