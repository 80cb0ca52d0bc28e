//! The runtime's single suspension primitive.
//!
//! Only the retry executor suspends, and it does so exclusively through
//! [`Delay`]. On a hosted target this is a thread sleep; on a
//! cooperative loop it is a bounded busy-wait that yields each
//! iteration; in tests it is a no-op or a manual-clock tick.

use crate::clock::{elapsed_ms, ManualClock, SharedClock};
use std::sync::Arc;
use std::time::Duration;

/// Suspends the caller for a number of milliseconds.
pub trait Delay: Send + Sync {
    /// Blocks (or cooperatively waits) for `ms` milliseconds.
    fn sleep_ms(&self, ms: u32);
}

/// Shared handle to a delay implementation.
pub type SharedDelay = Arc<dyn Delay>;

/// Hosted-target delay backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl ThreadDelay {
    /// Convenience constructor returning a [`SharedDelay`].
    pub fn shared() -> SharedDelay {
        Arc::new(Self)
    }
}

impl Delay for ThreadDelay {
    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Cooperative delay: busy-waits against a clock, yielding every
/// iteration so other threads (or a scheduler tick) can run.
pub struct SpinDelay {
    clock: SharedClock,
}

impl SpinDelay {
    /// Creates a spin delay observing `clock`.
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }
}

impl Delay for SpinDelay {
    fn sleep_ms(&self, ms: u32) {
        let start = self.clock.now_ms();
        while elapsed_ms(self.clock.now_ms(), start) < ms {
            std::thread::yield_now();
        }
    }
}

/// Delay that does nothing. For tests that only count sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelay;

impl NoopDelay {
    /// Convenience constructor returning a [`SharedDelay`].
    pub fn shared() -> SharedDelay {
        Arc::new(Self)
    }
}

impl Delay for NoopDelay {
    fn sleep_ms(&self, _ms: u32) {}
}

/// Test delay that advances a [`ManualClock`] by the requested amount,
/// so backoff sleeps move deterministic time forward instead of
/// blocking.
pub struct TickDelay {
    clock: Arc<ManualClock>,
}

impl TickDelay {
    /// Creates a tick delay driving `clock`.
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self { clock }
    }

    /// Convenience constructor returning a [`SharedDelay`].
    pub fn shared(clock: Arc<ManualClock>) -> SharedDelay {
        Arc::new(Self::new(clock))
    }
}

impl Delay for TickDelay {
    fn sleep_ms(&self, ms: u32) {
        self.clock.advance(ms);
    }
}
