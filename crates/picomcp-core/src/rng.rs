//! Pluggable random number source.
//!
//! Sessions need id entropy and the retry executor needs jitter; both
//! draw from an injected [`Rng`] so tests can replay fixed sequences.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

/// A source of random 32-bit values.
pub trait Rng: Send + Sync {
    /// Returns the next random value.
    fn next_u32(&self) -> u32;

    /// Returns a value in `[lo, hi)` derived via modulo.
    ///
    /// Returns `lo` when the range is empty.
    fn random_range(&self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        lo + self.next_u32() % (hi - lo)
    }

    /// Fills `buf` with random bytes, four at a time.
    fn fill_bytes(&self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(4) {
            let word = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }
}

/// Shared handle to an RNG.
pub type SharedRng = Arc<dyn Rng>;

/// Production RNG backed by the `rand` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRng;

impl ThreadRng {
    /// Convenience constructor returning a [`SharedRng`].
    pub fn shared() -> SharedRng {
        Arc::new(Self)
    }
}

impl Rng for ThreadRng {
    fn next_u32(&self) -> u32 {
        rand::random::<u32>()
    }
}

/// Deterministic RNG replaying a fixed sequence of values.
///
/// Once the sequence is exhausted it keeps returning the fallback
/// value (default 0). Intended for tests.
pub struct SequenceRng {
    values: Mutex<VecDeque<u32>>,
    fallback: u32,
}

impl SequenceRng {
    /// Creates a sequence RNG from the given values.
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
            fallback: 0,
        }
    }

    /// Sets the value returned after the sequence is exhausted.
    pub fn with_fallback(mut self, fallback: u32) -> Self {
        self.fallback = fallback;
        self
    }
}

impl Rng for SequenceRng {
    fn next_u32(&self) -> u32 {
        self.values
            .lock()
            .expect("sequence rng poisoned")
            .pop_front()
            .unwrap_or(self.fallback)
    }
}
