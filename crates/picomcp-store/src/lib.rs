//! Bounded key/value state store with TTL expiry and change listeners.
//!
//! Tools share transient state (watch slots, last readings, feature
//! flags) through this store rather than through process globals. Each
//! entry optionally expires after a TTL; expiry is lazy on read plus an
//! explicit [`StateStore::purge_expired`] sweep from the main tick.
//! Listeners observe set/remove/expire with stable ids.

mod store;

pub use store::{StateStore, StateStoreStats, StoreError, StoreEvent};
