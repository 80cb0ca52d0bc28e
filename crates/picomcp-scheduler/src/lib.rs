//! Cooperative periodic-task scheduler for picomcp.
//!
//! A fixed-capacity table of named callbacks driven by one external
//! tick: each [`Scheduler::run_pending`] pass runs every due task in
//! insertion order. Intervals do not accumulate drift compensation —
//! the next run is scheduled from the current tick, so jitter is
//! absorbed rather than causing catch-up bursts.
//!
//! Callbacks receive a [`SchedulerCtl`] staging handle instead of the
//! scheduler itself: schedule and cancel requests made mid-pass are
//! deferred and applied after the iteration, so a callback can never
//! invalidate the table it is running from.
//!
//! # Example
//!
//! ```
//! use picomcp_core::ManualClock;
//! use picomcp_scheduler::Scheduler;
//!
//! let clock = ManualClock::shared();
//! let mut sched = Scheduler::new(8, clock.clone());
//! sched.every("heartbeat", 1_000, |_ctl| {}).unwrap();
//!
//! assert_eq!(sched.run_pending(), 1); // due immediately
//! clock.advance(999);
//! assert_eq!(sched.run_pending(), 0);
//! clock.advance(1);
//! assert_eq!(sched.run_pending(), 1);
//! ```

mod scheduler;

pub use scheduler::{Scheduler, SchedulerCtl, SchedulerError, SchedulerStats};
