//! Long-running task lifecycle management for picomcp.
//!
//! A long-running tool invocation becomes a [`Task`] with a durable
//! status machine: `Working` and `InputRequired` are the live states,
//! `Completed` / `Failed` / `Cancelled` are terminal and immutable.
//! Mutators on a terminal task return `false` and change nothing.
//!
//! The pool holds up to `2 * max_tasks` records so clients can still
//! poll recently finished work; beyond that, terminal tasks are evicted
//! in insertion order. Live tasks are never evicted — when the excess
//! is all live, creation is refused instead.

mod error;
mod manager;
mod task;

pub use error::TaskError;
pub use manager::{TaskManager, TaskManagerStats, TaskPage, DEFAULT_POLL_INTERVAL_MS};
pub use task::{Task, TaskStatus};
