use picomcp_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use picomcp_core::ManualClock;
use std::sync::Arc;

fn breaker(threshold: u32, recovery: u32, half_open: u32) -> (CircuitBreaker, Arc<ManualClock>) {
    let clock = ManualClock::shared();
    let breaker = CircuitBreakerConfig::builder()
        .failure_threshold(threshold)
        .recovery_timeout_ms(recovery)
        .half_open_success_threshold(half_open)
        .clock(clock.clone())
        .name("integration")
        .build();
    (breaker, clock)
}

/// Trip-and-recover scenario: threshold 3, recovery 500 ms, two
/// half-open successes to close. A probe at t=499 is rejected, the
/// probe at t=500 admitted; two successes close the circuit with
/// trips=1 and rejected=1.
#[test]
fn trip_and_recover_with_literal_timings() {
    let (mut cb, clock) = breaker(3, 500, 2);

    for _ in 0..3 {
        assert!(cb.allow_request());
        cb.record_failure();
    }
    assert_eq!(cb.state(), CircuitState::Open);

    clock.set(499);
    assert!(!cb.allow_request());

    clock.set(500);
    assert!(cb.allow_request());
    assert_eq!(cb.state(), CircuitState::HalfOpen);

    cb.record_success();
    cb.record_success();
    assert_eq!(cb.state(), CircuitState::Closed);

    let stats = cb.stats();
    assert_eq!(stats.trip_count, 1);
    assert_eq!(stats.rejected_count, 1);
}

/// While closed, interleaved successes keep resetting the consecutive
/// failure run, so the circuit never opens below the threshold.
#[test]
fn closed_survives_interleaved_failures() {
    let (mut cb, _clock) = breaker(3, 500, 1);
    for _ in 0..10 {
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
    }
    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.stats().trip_count, 0);
}

/// A half-open probe failure reopens immediately and restarts the
/// recovery window from that failure.
#[test]
fn failed_probe_restarts_the_recovery_window() {
    let (mut cb, clock) = breaker(2, 400, 1);
    cb.record_failure();
    cb.record_failure();
    assert_eq!(cb.state(), CircuitState::Open);

    clock.set(400);
    assert!(cb.allow_request());
    cb.record_failure(); // probe fails at t=400
    assert_eq!(cb.state(), CircuitState::Open);

    clock.set(799);
    assert!(!cb.allow_request());
    clock.set(800);
    assert!(cb.allow_request());
    assert_eq!(cb.stats().trip_count, 2);
}

/// retry_after_ms counts down while open and reads zero otherwise.
#[test]
fn retry_after_reflects_remaining_recovery() {
    let (mut cb, clock) = breaker(1, 300, 1);
    assert_eq!(cb.retry_after_ms(), 0);
    cb.record_failure();
    assert_eq!(cb.retry_after_ms(), 300);
    clock.advance(120);
    assert_eq!(cb.retry_after_ms(), 180);
    clock.advance(180);
    assert!(cb.allow_request());
    assert_eq!(cb.retry_after_ms(), 0);
}
