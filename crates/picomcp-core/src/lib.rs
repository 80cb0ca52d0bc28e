//! Core infrastructure for picomcp.
//!
//! This crate provides the shared plumbing used across all picomcp
//! components:
//! - A monotonic millisecond [`Clock`] abstraction with wrap-safe
//!   duration arithmetic
//! - A pluggable [`Rng`] source for session ids and retry jitter
//! - A [`Delay`] primitive, the single suspension point of the runtime
//! - An event system for observability ([`EventListeners`])
//!
//! The runtime is single-threaded and cooperative: components never
//! block except through [`Delay`], and every duration computation goes
//! through [`clock::elapsed_ms`] so that 32-bit counter wrap-around is
//! harmless.

pub mod clock;
pub mod delay;
pub mod events;
pub mod rng;

pub use clock::{elapsed_ms, reached, Clock, ManualClock, MonotonicClock, SharedClock};
pub use delay::{Delay, NoopDelay, SharedDelay, SpinDelay, ThreadDelay, TickDelay};
pub use events::{EventListener, EventListeners, FnListener, ListenerId, RuntimeEvent};
pub use rng::{Rng, SequenceRng, SharedRng, ThreadRng};
