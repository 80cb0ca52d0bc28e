//! Session management for picomcp.
//!
//! Sessions cap client concurrency and expire silently when idle.
//! Ids are 32 lowercase hex characters from 16 bytes of injected
//! entropy; uniqueness is assumed statistically and not checked.
//!
//! When the active set is full, [`SessionManager::create`] prunes
//! expired sessions first, then evicts the most idle session; if every
//! session was touched at the current instant, creation is refused.

mod manager;

pub use manager::{Session, SessionError, SessionManager, SessionManagerStats};
