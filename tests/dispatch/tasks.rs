use super::harness;
use picomcp_dispatch::{codes, Identity, Request, ToolEntry};
use picomcp_retry::RetryableError;
use serde_json::json;

fn create(name: &str) -> Request {
    Request::new(1, "tasks/create", json!({ "name": name, "arguments": {} }))
}

fn task_request(method: &str, id: &str) -> Request {
    Request::new(2, method, json!({ "taskId": id }))
}

#[test]
fn long_running_tool_returns_a_task_handle() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::long_running("wifi_scan", 250, |_, _| Ok(())));

    let response = dispatcher.dispatch(&create("wifi_scan"), &Identity::anonymous());
    let result = response.result.unwrap();
    assert_eq!(result["taskId"], "task-1");
    assert_eq!(result["status"], "working");
    assert_eq!(result["pollIntervalMs"], 250);
}

#[test]
fn tools_call_on_a_long_running_tool_takes_the_task_path() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::long_running("wifi_scan", 250, |_, _| Ok(())));

    let response = dispatcher.dispatch(
        &Request::new(1, "tools/call", json!({ "name": "wifi_scan", "arguments": {} })),
        &Identity::anonymous(),
    );
    assert_eq!(response.result.unwrap()["taskId"], "task-1");
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[test]
fn handler_drives_the_task_to_completion() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::long_running("wifi_scan", 250, |_, _| Ok(())));
    dispatcher.dispatch(&create("wifi_scan"), &Identity::anonymous());

    // The handler (driven by the embedding loop) finishes the task
    // through the dispatcher so the breaker sees the outcome.
    let payload = br#"{"networks": 3}"#;
    assert!(dispatcher.complete_task("task-1", payload.to_vec()));

    let response = dispatcher.dispatch(&task_request("tasks/get", "task-1"), &Identity::anonymous());
    let result = response.result.unwrap();
    assert_eq!(result["status"], "completed");
    assert_eq!(result["result"], hex(payload));
}

#[test]
fn binary_results_survive_as_hex() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::long_running("camera_capture", 250, |_, _| Ok(())));
    dispatcher.dispatch(&create("camera_capture"), &Identity::anonymous());

    // Raw bytes that are not valid UTF-8 must come back unchanged.
    let frame = vec![0xFF, 0xD8, 0x00, 0x9C, 0xFF];
    assert!(dispatcher.complete_task("task-1", frame.clone()));

    let response = dispatcher.dispatch(&task_request("tasks/get", "task-1"), &Identity::anonymous());
    assert_eq!(response.result.unwrap()["result"], "ffd8009cff");
}

#[test]
fn task_outcomes_feed_the_tool_breaker() {
    let (mut dispatcher, _clock) = harness(); // breaker threshold 3
    dispatcher.register_tool(ToolEntry::long_running("wifi_scan", 250, |_, _| Ok(())));

    for i in 1..=3 {
        assert!(dispatcher
            .dispatch(&create("wifi_scan"), &Identity::anonymous())
            .is_success());
        assert!(dispatcher.fail_task(&format!("task-{i}"), "antenna fault"));
    }

    // Three task failures tripped the tool's breaker: the next
    // creation is cut off at the gate.
    let response = dispatcher.dispatch(&create("wifi_scan"), &Identity::anonymous());
    assert_eq!(response.error_code(), Some(codes::CIRCUIT_OPEN));
}

#[test]
fn terminating_unknown_or_terminal_tasks_records_nothing() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::long_running("wifi_scan", 250, |_, _| Ok(())));
    dispatcher.dispatch(&create("wifi_scan"), &Identity::anonymous());

    assert!(!dispatcher.complete_task("task-404", Vec::new()));
    assert!(!dispatcher.fail_task("task-404", "late"));

    assert!(dispatcher.complete_task("task-1", Vec::new()));
    assert!(!dispatcher.fail_task("task-1", "already done"));
    // Only the completion reached the breaker.
    let stats = dispatcher.stats();
    assert_eq!(stats["circuitBreakers"]["openCount"], 0);
}

#[test]
fn cancel_is_advisory_and_terminal_cancel_is_flagged() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::long_running("wifi_scan", 250, |_, _| Ok(())));
    dispatcher.dispatch(&create("wifi_scan"), &Identity::anonymous());

    let response =
        dispatcher.dispatch(&task_request("tasks/cancel", "task-1"), &Identity::anonymous());
    assert_eq!(response.result.unwrap()["cancelled"], true);

    // Cancelling again hits a terminal task: refused, and recorded in
    // the event store as an error-severity entry.
    let response =
        dispatcher.dispatch(&task_request("tasks/cancel", "task-1"), &Identity::anonymous());
    assert_eq!(response.result.unwrap()["cancelled"], false);
    let errors = dispatcher
        .events()
        .min_severity(picomcp_eventlog::Severity::Error);
    assert!(!errors.is_empty());
}

#[test]
fn unknown_task_ids_are_invalid_params() {
    let (mut dispatcher, _clock) = harness();
    let response =
        dispatcher.dispatch(&task_request("tasks/get", "task-404"), &Identity::anonymous());
    assert_eq!(response.error_code(), Some(codes::INVALID_PARAMS));
}

#[test]
fn task_listing_paginates() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::long_running("scan", 100, |_, _| Ok(())));
    for _ in 0..3 {
        dispatcher.dispatch(&create("scan"), &Identity::anonymous());
    }

    let response = dispatcher.dispatch(
        &Request::new(3, "tasks/list", json!({ "start": 0, "pageSize": 2 })),
        &Identity::anonymous(),
    );
    let result = response.result.unwrap();
    assert_eq!(result["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(result["nextOffset"], 2);
}

#[test]
fn a_failing_starter_fails_the_task_and_the_breaker_sees_it() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::long_running("doomed", 100, |_, _| {
        Err(RetryableError::msg("no free DMA channel"))
    }));

    let response = dispatcher.dispatch(&create("doomed"), &Identity::anonymous());
    assert_eq!(response.error_code(), Some(codes::TOOL_FAILED));

    let get = dispatcher.dispatch(&task_request("tasks/get", "task-1"), &Identity::anonymous());
    assert_eq!(get.result.unwrap()["status"], "failed");
}

#[test]
fn sync_tools_cannot_be_created_as_tasks() {
    let (mut dispatcher, _clock) = harness();
    dispatcher.register_tool(ToolEntry::sync("echo", |args| {
        picomcp_retry::Outcome::Success(args.clone())
    }));
    let response = dispatcher.dispatch(&create("echo"), &Identity::anonymous());
    assert_eq!(response.error_code(), Some(codes::INVALID_PARAMS));
}

#[test]
fn pool_exhaustion_is_a_typed_error() {
    let (mut dispatcher, _clock) = harness(); // max_tasks 4, ceiling 8
    dispatcher.register_tool(ToolEntry::long_running("scan", 100, |_, _| Ok(())));
    for _ in 0..8 {
        assert!(dispatcher
            .dispatch(&create("scan"), &Identity::anonymous())
            .is_success());
    }
    let response = dispatcher.dispatch(&create("scan"), &Identity::anonymous());
    assert_eq!(response.error_code(), Some(codes::RESOURCE_EXHAUSTED));
}
