//! Circuit breakers for picomcp tool invocations.
//!
//! A breaker cuts off a failing downstream after a run of consecutive
//! failures and probes for recovery after a timeout.
//!
//! ## States
//! - **Closed**: normal operation, all requests pass through
//! - **Open**: tripped, requests are rejected immediately
//! - **HalfOpen**: probing whether the downstream has recovered
//!
//! `failure_threshold` consecutive failures trip the breaker Open.
//! After `recovery_timeout_ms`, the next [`allow_request`] transitions
//! to HalfOpen and admits a probe; `half_open_success_threshold`
//! consecutive probe successes close it again, while a single probe
//! failure reopens it.
//!
//! [`CircuitBreakerRegistry`] holds one named breaker per tool in a
//! bounded pool with LRU eviction.
//!
//! [`allow_request`]: CircuitBreaker::allow_request
//!
//! # Example
//!
//! ```
//! use picomcp_circuitbreaker::{CircuitBreakerConfig, CircuitState};
//! use picomcp_core::ManualClock;
//!
//! let clock = ManualClock::shared();
//! let mut breaker = CircuitBreakerConfig::builder()
//!     .failure_threshold(3)
//!     .recovery_timeout_ms(500)
//!     .clock(clock.clone())
//!     .name("modbus_read")
//!     .build();
//!
//! for _ in 0..3 {
//!     breaker.record_failure();
//! }
//! assert_eq!(breaker.state(), CircuitState::Open);
//! assert!(!breaker.allow_request());
//!
//! clock.advance(500);
//! assert!(breaker.allow_request()); // the probe
//! assert_eq!(breaker.state(), CircuitState::HalfOpen);
//! ```

mod breaker;
mod config;
mod error;
mod events;
mod registry;

pub use breaker::{CircuitBreaker, CircuitBreakerStats, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
pub use registry::{CircuitBreakerRegistry, RegistryStats};
