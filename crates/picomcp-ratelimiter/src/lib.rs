//! Token-bucket rate limiting for picomcp.
//!
//! Two variants share one bucket algorithm:
//! - [`RateLimiter`]: a single global bucket
//! - [`KeyedRateLimiter`]: a bounded pool of per-key buckets with LRU
//!   eviction by last access
//!
//! Refill is lazy: tokens accumulate proportionally to the time elapsed
//! since the last refill, clamped to capacity. Denial is a signaling
//! outcome ([`Decision::Denied`]) carrying the recommended wait, not an
//! error; the dispatch boundary converts it to
//! [`RateLimitError::LimitExceeded`] when a JSON-RPC reply is needed.
//!
//! # Example
//!
//! ```
//! use picomcp_core::ManualClock;
//! use picomcp_ratelimiter::RateLimiterConfig;
//!
//! let clock = ManualClock::shared();
//! let mut limiter = RateLimiterConfig::builder()
//!     .capacity(5.0)
//!     .refill_per_sec(10.0)
//!     .clock(clock.clone())
//!     .name("global")
//!     .build();
//!
//! for _ in 0..5 {
//!     assert!(limiter.try_acquire_one().is_allowed());
//! }
//! let denied = limiter.try_acquire_one();
//! assert!(!denied.is_allowed());
//!
//! clock.advance(1_000); // a full second refills the bucket
//! assert!(limiter.try_acquire_one().is_allowed());
//! ```

mod bucket;
mod config;
mod error;
mod events;
mod keyed;

pub use bucket::{Decision, RateLimiter, RateLimiterStats};
pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use error::RateLimitError;
pub use events::RateLimiterEvent;
pub use keyed::{KeyedRateLimiter, KeyedRateLimiterStats};
