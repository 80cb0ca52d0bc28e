use picomcp_core::ThreadRng;
use picomcp_retry::{Jitter, RetryPolicy};

fn policy(jitter: Jitter) -> RetryPolicy {
    RetryPolicy::builder()
        .base_delay_ms(100)
        .multiplier(2.0)
        .max_delay_ms(1_000)
        .jitter(jitter)
        .build()
}

const SAMPLES: usize = 500;

/// No jitter is deterministic: the pure exponential ramp.
#[test]
fn none_is_deterministic() {
    let p = policy(Jitter::None);
    let rng = ThreadRng;
    for _ in 0..SAMPLES {
        assert_eq!(p.delay_for_attempt(3, 0, &rng), 800);
    }
}

/// Full jitter samples uniformly below the ramp value.
#[test]
fn full_jitter_range() {
    let p = policy(Jitter::Full);
    let rng = ThreadRng;
    let mut low = false;
    for _ in 0..SAMPLES {
        let d = p.delay_for_attempt(3, 0, &rng);
        assert!(d < 800, "full jitter out of range: {d}");
        if d < 400 {
            low = true;
        }
    }
    // With 500 samples the lower half is hit overwhelmingly often.
    assert!(low, "full jitter never sampled the lower half");
}

/// Equal jitter keeps at least half the ramp value.
#[test]
fn equal_jitter_range() {
    let p = policy(Jitter::Equal);
    let rng = ThreadRng;
    for _ in 0..SAMPLES {
        let d = p.delay_for_attempt(3, 0, &rng);
        assert!((400..800).contains(&d), "equal jitter out of range: {d}");
    }
}

/// Decorrelated jitter stays within [base, 3 * prev] clamped to the
/// delay ceiling.
#[test]
fn decorrelated_jitter_range() {
    let p = policy(Jitter::Decorrelated);
    let rng = ThreadRng;
    let mut last = 0u32;
    for _ in 0..SAMPLES {
        let d = p.delay_for_attempt(2, last, &rng);
        let prev = last.max(100);
        let upper = (prev.saturating_mul(3)).min(1_000);
        assert!(
            d >= 100.min(upper) && d <= upper,
            "decorrelated out of range: {d} (prev {prev})"
        );
        last = d;
    }
}
