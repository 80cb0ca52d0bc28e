//! Retry execution for picomcp tool invocations.
//!
//! The executor runs an operation up to `max_retries + 1` times,
//! sleeping between attempts with exponential backoff and one of four
//! jitter strategies ([`Jitter`]). Operations classify their own
//! outcomes: [`Outcome::Retryable`] errors are retried until the budget
//! runs out, [`Outcome::Fatal`] errors short-circuit immediately, and a
//! total wall-clock budget (`total_timeout_ms`) is enforced between
//! attempts.
//!
//! [`PolicyRegistry`] keeps named policies with per-name accumulated
//! statistics, bounded with the same LRU discipline as the other
//! picomcp pools.
//!
//! # Example
//!
//! ```
//! use picomcp_core::{ManualClock, NoopDelay, SequenceRng};
//! use picomcp_retry::{Outcome, RetryExecutor, RetryPolicy, RetryableError};
//! use std::sync::Arc;
//!
//! let clock = ManualClock::shared();
//! let policy = RetryPolicy::builder()
//!     .max_retries(2)
//!     .base_delay_ms(100)
//!     .build();
//! let mut executor = RetryExecutor::builder()
//!     .clock(clock)
//!     .delay(NoopDelay::shared())
//!     .rng(Arc::new(SequenceRng::new([])))
//!     .build();
//!
//! let mut calls = 0;
//! let result: Result<&str, _> = executor.execute(&policy, |_attempt| {
//!     calls += 1;
//!     if calls < 3 {
//!         Outcome::Retryable(RetryableError::msg("transient"))
//!     } else {
//!         Outcome::Success("done")
//!     }
//! });
//! assert_eq!(result.unwrap(), "done");
//! assert_eq!(executor.stats().attempts, 3);
//! ```

mod error;
mod events;
mod executor;
mod policy;
mod registry;

pub use error::{RetryError, RetryableError};
pub use events::RetryEvent;
pub use executor::{Outcome, RetryExecutor, RetryExecutorBuilder, RetryStats};
pub use policy::{Jitter, RetryPolicy, RetryPolicyBuilder};
pub use registry::{PolicyRegistry, PolicyStatsSnapshot};
