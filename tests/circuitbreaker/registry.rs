use picomcp_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
use picomcp_core::ManualClock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One breaker per tool, stamped from the shared template.
#[test]
fn per_tool_breakers_are_independent() {
    let clock = ManualClock::shared();
    let template = CircuitBreakerConfig::builder()
        .failure_threshold(2)
        .recovery_timeout_ms(1_000)
        .clock(clock)
        .build_config();
    let mut registry = CircuitBreakerRegistry::new(template);

    registry.get_or_insert("camera_capture").record_failure();
    registry.get_or_insert("camera_capture").record_failure();
    registry.get_or_insert("modbus_read").record_failure();

    assert_eq!(
        registry.get_or_insert("camera_capture").state(),
        CircuitState::Open
    );
    assert_eq!(
        registry.get_or_insert("modbus_read").state(),
        CircuitState::Closed
    );
    assert_eq!(registry.stats().open_count, 1);
}

/// The registry's global transition listener reaches breakers created
/// after registration.
#[test]
fn global_listener_propagates() {
    let transitions = Arc::new(AtomicUsize::new(0));
    let transitions_clone = Arc::clone(&transitions);
    let clock = ManualClock::shared();
    let template = CircuitBreakerConfig::builder()
        .failure_threshold(1)
        .recovery_timeout_ms(100)
        .clock(clock.clone())
        .on_state_transition(move |_, _| {
            transitions_clone.fetch_add(1, Ordering::SeqCst);
        })
        .build_config();
    let mut registry = CircuitBreakerRegistry::new(template);

    registry.get_or_insert("a").record_failure(); // Closed -> Open
    clock.advance(100);
    registry.get_or_insert("a").allow_request(); // Open -> HalfOpen
    registry.get_or_insert("a").record_success(); // HalfOpen -> Closed
    registry.get_or_insert("b").record_failure(); // Closed -> Open

    assert_eq!(transitions.load(Ordering::SeqCst), 4);
}

/// Eviction keeps the most recently touched breakers.
#[test]
fn bounded_registry_evicts_lru() {
    let clock = ManualClock::shared();
    let template = CircuitBreakerConfig::builder().clock(clock.clone()).build_config();
    let mut registry = CircuitBreakerRegistry::with_capacity(template, 3);

    for name in ["a", "b", "c"] {
        registry.get_or_insert(name);
        clock.advance(10);
    }
    registry.get_or_insert("a"); // refresh "a"
    clock.advance(10);
    registry.get_or_insert("d"); // evicts "b"

    assert!(registry.get("a").is_some());
    assert!(registry.get("b").is_none());
    assert!(registry.get("c").is_some());
    assert_eq!(registry.stats().evictions, 1);
}
