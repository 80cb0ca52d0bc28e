use picomcp_core::{Clock, ManualClock, TickDelay};
use picomcp_retry::{Jitter, Outcome, RetryError, RetryExecutor, RetryPolicy, RetryableError};
use std::sync::Arc;

fn executor() -> (RetryExecutor, Arc<ManualClock>) {
    let clock = ManualClock::shared();
    let executor = RetryExecutor::builder()
        .clock(clock.clone())
        .delay(TickDelay::shared(Arc::clone(&clock)))
        .name("integration")
        .build();
    (executor, clock)
}

/// Total-budget scenario: max_retries 4, base 100 ms doubling, budget
/// 300 ms, operation always retryable. Attempts land at t=0, 100, 300;
/// the third finds the budget spent and times out with attempts=3,
/// retries=2, timeouts=1.
#[test]
fn budget_cuts_the_attempt_sequence() {
    let (mut executor, clock) = executor();
    let policy = RetryPolicy::builder()
        .max_retries(4)
        .base_delay_ms(100)
        .multiplier(2.0)
        .max_delay_ms(1_000)
        .total_timeout_ms(300)
        .jitter(Jitter::None)
        .build();

    let mut attempt_times = Vec::new();
    let result: Result<(), _> = executor.execute(&policy, |_| {
        attempt_times.push(clock.now_ms());
        Outcome::Retryable(RetryableError::msg("unreachable peripheral"))
    });

    assert_eq!(attempt_times, [0, 100]);
    assert!(matches!(result, Err(RetryError::TimedOut { elapsed_ms: 300 })));
    let stats = executor.stats();
    assert_eq!(stats.attempts, 3);
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.fatal_errors, 0);
}

/// Without a budget, exhaustion takes exactly max_retries + 1 attempts
/// and sleeps the full exponential ramp.
#[test]
fn exhaustion_bound() {
    let (mut executor, clock) = executor();
    let policy = RetryPolicy::builder()
        .max_retries(3)
        .base_delay_ms(100)
        .multiplier(2.0)
        .max_delay_ms(1_000)
        .jitter(Jitter::None)
        .build();

    let result: Result<(), _> =
        executor.execute(&policy, |_| Outcome::Retryable(RetryableError::msg("x")));
    assert!(matches!(result, Err(RetryError::Exhausted(_))));
    // 100 + 200 + 400
    assert_eq!(clock.now_ms(), 700);
    assert_eq!(executor.stats().attempts, 4);
}

/// The attempt counter passed to the operation is 0-based and
/// increments by one per call.
#[test]
fn operation_sees_attempt_numbers() {
    let (mut executor, _clock) = executor();
    let policy = RetryPolicy::builder()
        .max_retries(2)
        .base_delay_ms(1)
        .jitter(Jitter::None)
        .build();

    let mut seen = Vec::new();
    let _ = executor.execute::<(), _>(&policy, |attempt| {
        seen.push(attempt);
        Outcome::Retryable(RetryableError::msg("x"))
    });
    assert_eq!(seen, [0, 1, 2]);
}

/// Mixed outcomes across executions accumulate into the same stats.
#[test]
fn cumulative_stats_across_executions() {
    let (mut executor, _clock) = executor();
    let policy = RetryPolicy::builder()
        .max_retries(1)
        .base_delay_ms(1)
        .jitter(Jitter::None)
        .build();

    let _ = executor.execute(&policy, |_| Outcome::Success(()));
    let _ = executor.execute::<(), _>(&policy, |_| {
        Outcome::Fatal(RetryableError::msg("broken"))
    });
    let _ = executor.execute::<(), _>(&policy, |_| {
        Outcome::Retryable(RetryableError::msg("flaky"))
    });

    let stats = executor.stats();
    assert_eq!(stats.attempts, 1 + 1 + 2);
    assert_eq!(stats.successes, 1);
    assert_eq!(stats.fatal_errors, 1);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.retries, 1);
}
