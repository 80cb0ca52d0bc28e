//! Fixed-capacity event store and audit log for picomcp.
//!
//! Both logs are true circular buffers (head index plus count, modular
//! indexing — eviction never shifts elements) of structured records
//! with a monotonic sequence number. Eviction is FIFO and does not
//! rewind the sequence; [`EventStore::clear`] keeps the sequence
//! running, only [`EventStore::reset`] rewinds it.

mod audit;
mod events;
mod ring;

pub use audit::{AuditAction, AuditEntry, AuditLog, AuditLogStats};
pub use events::{EventRecord, EventStore, EventStoreStats, Severity};
pub use ring::RingBuffer;
