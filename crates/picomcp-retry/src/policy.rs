use picomcp_core::Rng;
use serde::Serialize;

/// Jitter strategy applied to a computed backoff delay.
///
/// Jitter decorrelates retries across clients so that failures do not
/// produce synchronized thundering herds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Jitter {
    /// Use the computed delay as-is.
    None,
    /// Uniform random in `[0, d)`.
    Full,
    /// `d/2` plus uniform random in `[0, d/2)`.
    Equal,
    /// AWS-style decorrelated jitter derived from the previous delay.
    Decorrelated,
}

/// Backoff and budget parameters for a retry execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub(crate) max_retries: u32,
    pub(crate) base_delay_ms: u32,
    pub(crate) multiplier: f64,
    pub(crate) max_delay_ms: u32,
    /// Total wall-clock budget; 0 disables the budget.
    pub(crate) total_timeout_ms: u32,
    pub(crate) jitter: Jitter,
}

impl RetryPolicy {
    /// Creates a new policy builder.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Maximum number of retries after the initial attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total wall-clock budget in milliseconds; 0 means unlimited.
    pub fn total_timeout_ms(&self) -> u32 {
        self.total_timeout_ms
    }

    /// Computes the backoff delay for `attempt` (0-based), before
    /// clamping to any remaining total budget.
    ///
    /// The exponential ramp multiplies the base delay `attempt` times,
    /// clamping at `max_delay_ms`; jitter is then applied using `rng`.
    /// `last_delay_ms` feeds the decorrelated strategy.
    pub fn delay_for_attempt(&self, attempt: u32, last_delay_ms: u32, rng: &dyn Rng) -> u32 {
        let mut d = f64::from(self.base_delay_ms);
        let max = f64::from(self.max_delay_ms);
        for _ in 0..attempt {
            d *= self.multiplier;
            if d >= max {
                d = max;
                break;
            }
        }
        let d = d.min(max) as u32;

        match self.jitter {
            Jitter::None => d,
            Jitter::Full => rng.random_range(0, d),
            Jitter::Equal => d / 2 + rng.random_range(0, d / 2),
            Jitter::Decorrelated => {
                let prev = last_delay_ms.max(self.base_delay_ms);
                let upper = u64::from(prev)
                    .saturating_mul(3)
                    .min(u64::from(self.max_delay_ms)) as u32;
                let lower = self.base_delay_ms.min(upper);
                lower + rng.random_range(0, upper.saturating_sub(lower))
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicyBuilder::new().build()
    }
}

/// Builder for [`RetryPolicy`].
pub struct RetryPolicyBuilder {
    max_retries: u32,
    base_delay_ms: u32,
    multiplier: f64,
    max_delay_ms: u32,
    total_timeout_ms: u32,
    jitter: Jitter,
}

impl RetryPolicyBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 10_000,
            total_timeout_ms: 0,
            jitter: Jitter::None,
        }
    }

    /// Sets the number of retries after the initial attempt.
    ///
    /// Default: 3
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Sets the first backoff delay.
    ///
    /// Default: 100 ms
    pub fn base_delay_ms(mut self, ms: u32) -> Self {
        self.base_delay_ms = ms;
        self
    }

    /// Sets the exponential growth factor applied per attempt.
    ///
    /// Default: 2.0
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Sets the ceiling on a single backoff delay.
    ///
    /// Default: 10 000 ms
    pub fn max_delay_ms(mut self, ms: u32) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Sets the total wall-clock budget across all attempts, enforced
    /// between attempts. 0 disables the budget.
    ///
    /// Default: 0 (none)
    pub fn total_timeout_ms(mut self, ms: u32) -> Self {
        self.total_timeout_ms = ms;
        self
    }

    /// Sets the jitter strategy.
    ///
    /// Default: [`Jitter::None`]
    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Builds the policy.
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            multiplier: self.multiplier,
            max_delay_ms: self.max_delay_ms.max(self.base_delay_ms),
            total_timeout_ms: self.total_timeout_ms,
            jitter: self.jitter,
        }
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
