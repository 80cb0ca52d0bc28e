//! End-to-end scenarios exercising the whole pipeline with literal
//! values.

use super::harness;
use picomcp_dispatch::{codes, Identity, Request, ToolEntry};
use picomcp_eventlog::AuditAction;
use picomcp_retry::Outcome;
use serde_json::json;

fn call(name: &str) -> Request {
    Request::new(1, "tools/call", json!({ "name": name, "arguments": {} }))
}

/// RBAC default-role scenario: `gpio_write` restricted to admin. The
/// anonymous caller (role guest) is denied with -32002 and an
/// AccessDenied audit row; after mapping key K to admin, the same call
/// with K succeeds and audits ToolCall(success).
#[test]
fn rbac_default_role_flow() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::sync("gpio_write", |_| Outcome::Success(json!("ok"))));
    dispatcher.rbac_mut().allow("gpio_write", "admin");

    let response = dispatcher.dispatch(&call("gpio_write"), &Identity::anonymous());
    assert_eq!(response.error_code(), Some(codes::ACCESS_DENIED));
    let denied = dispatcher.audit().by_action(AuditAction::AccessDenied);
    assert_eq!(denied.len(), 1);
    assert_eq!(denied[0].actor, "anonymous");
    assert_eq!(denied[0].target, "gpio_write");

    dispatcher.rbac_mut().assign("K", "admin");
    let response = dispatcher.dispatch(&call("gpio_write"), &Identity::with_key("K"));
    assert!(response.is_success());
    let calls = dispatcher.audit().by_action(AuditAction::ToolCall);
    assert_eq!(calls.len(), 1);
    assert!(calls[0].success);
    assert_eq!(calls[0].actor, "K");
}

/// The audit trail and event store tell the same story as the wire
/// responses across a mixed workload.
#[test]
fn observability_matches_outcomes() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::sync("good", |_| Outcome::Success(json!(1))));
    dispatcher.register_tool(ToolEntry::sync("bad", |_| {
        Outcome::Fatal(picomcp_retry::RetryableError::msg("dead sensor"))
    }));

    let identity = Identity::with_key("ops");
    assert!(dispatcher.dispatch(&call("good"), &identity).is_success());
    assert!(dispatcher.dispatch(&call("good"), &identity).is_success());
    assert!(!dispatcher.dispatch(&call("bad"), &identity).is_success());

    let calls = dispatcher.audit().by_action(AuditAction::ToolCall);
    assert_eq!(calls.len(), 3);
    assert_eq!(calls.iter().filter(|c| c.success).count(), 2);

    let stats = dispatcher.stats();
    assert_eq!(stats["retry"]["successes"], 2);
    assert_eq!(stats["retry"]["fatalErrors"], 1);
    assert_eq!(stats["rateLimiter"]["totalAllowed"], 3);
}

/// The cooperative tick drives scheduler, watchdog, store, and session
/// pruning from one call.
#[test]
fn tick_runs_the_housekeeping() {
    let (mut dispatcher, clock) = harness();

    let sid = dispatcher.sessions_mut().create("sleepy").unwrap();
    dispatcher
        .store_mut()
        .set("ephemeral", json!(1), 1_000)
        .unwrap();
    dispatcher.watchdog_mut().add("loop", 5_000, None).unwrap();
    dispatcher.watchdog_mut().kick("loop");
    dispatcher
        .scheduler_mut()
        .every("heartbeat", 10_000, |_| {})
        .unwrap();

    clock.advance(61_000); // past session idle, store TTL, watchdog
    dispatcher.tick();

    assert_eq!(dispatcher.sessions_mut().active_count(), 0);
    assert!(!dispatcher.store_mut().contains("ephemeral"));
    assert_eq!(
        dispatcher.watchdog_mut().state("loop"),
        Some(picomcp_watchdog::EntryState::Expired)
    );
    assert_eq!(dispatcher.scheduler_mut().exec_count("heartbeat"), Some(1));
    let _ = sid;
}
