//! Test organization:
//! - state_machine.rs: the Closed/Open/HalfOpen cycle with literal
//!   timings
//! - registry.rs: bounded registry and listener propagation

mod registry;
mod state_machine;
