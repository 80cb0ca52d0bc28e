//! Software watchdog for picomcp.
//!
//! Each named entry tracks a liveness deadline: a task that fails to
//! [`kick`](Watchdog::kick) within its timeout is marked `Expired` on
//! the next [`check`](Watchdog::check) pass and its timeout callbacks
//! fire. Expiry is edge-triggered — an entry fires once per expiry,
//! not once per check tick, until it is kicked healthy again.

mod watchdog;

pub use watchdog::{EntryState, Watchdog, WatchdogError, WatchdogStats};
