use picomcp_core::ManualClock;
use picomcp_tasks::{TaskError, TaskManager, TaskStatus};

/// The lifecycle scenario: create -> input-required -> cancelled, then
/// every further mutation is refused and the record is frozen.
#[test]
fn cancel_freezes_the_task() {
    let clock = ManualClock::shared();
    let mut mgr = TaskManager::new(4, clock.clone());

    let id = mgr.create_task("scan", -1, 500).unwrap();
    assert_eq!(id, "task-1");
    assert_eq!(mgr.get(&id).unwrap().status, TaskStatus::Working);

    assert!(mgr.update_status(&id, TaskStatus::InputRequired, "need channel"));
    assert!(mgr.cancel_task(&id));
    assert_eq!(mgr.get(&id).unwrap().status, TaskStatus::Cancelled);

    clock.advance(10_000);
    assert!(!mgr.complete_task(&id, b"result".to_vec()));
    let task = mgr.get(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Cancelled);
    assert!(task.result.is_none());
}

/// Every permitted transition out of the two live states.
#[test]
fn transition_matrix() {
    let clock = ManualClock::shared();
    let mut mgr = TaskManager::new(8, clock);

    // Working -> each terminal
    for terminal in [TaskStatus::Completed, TaskStatus::Failed, TaskStatus::Cancelled] {
        let id = mgr.create_task("t", -1, 500).unwrap();
        assert!(mgr.update_status(&id, terminal, ""));
        assert!(!mgr.update_status(&id, TaskStatus::Working, ""));
    }

    // Working <-> InputRequired, then terminal
    let id = mgr.create_task("t", -1, 500).unwrap();
    assert!(mgr.update_status(&id, TaskStatus::InputRequired, ""));
    assert!(mgr.update_status(&id, TaskStatus::Working, ""));
    assert!(mgr.update_status(&id, TaskStatus::InputRequired, ""));
    assert!(mgr.complete_task(&id, Vec::new()));
    assert_eq!(mgr.get(&id).unwrap().status, TaskStatus::Completed);
}

/// Eviction keeps live tasks at the expense of finished ones, oldest
/// first, and refuses creation once only live tasks remain.
#[test]
fn eviction_prefers_terminal_tasks() {
    let clock = ManualClock::shared();
    let mut mgr = TaskManager::new(2, clock); // ceiling 4

    let ids: Vec<String> = (0..4)
        .map(|_| mgr.create_task("t", -1, 500).unwrap())
        .collect();
    mgr.complete_task(&ids[1], Vec::new());

    // Evicts task-2 (the only terminal), keeps the three live tasks.
    let id5 = mgr.create_task("t", -1, 500).unwrap();
    assert!(mgr.get(&ids[1]).is_none());
    assert!(mgr.get(&ids[0]).is_some());
    assert!(mgr.get(&id5).is_some());

    // Now four live tasks: the pool must refuse.
    assert_eq!(mgr.create_task("t", -1, 500), Err(TaskError::PoolFull));
}

/// Pagination walks the pool in insertion order and terminates with a
/// zero offset.
#[test]
fn pagination_walks_everything_once() {
    let clock = ManualClock::shared();
    let mut mgr = TaskManager::new(8, clock);
    for _ in 0..7 {
        mgr.create_task("t", -1, 500).unwrap();
    }

    let mut seen = Vec::new();
    let mut offset = 0usize;
    loop {
        let page = mgr.list_tasks(offset, 3);
        seen.extend(page.tasks.iter().map(|t| t.id.clone()));
        if page.next_offset == 0 {
            break;
        }
        offset = page.next_offset as usize;
    }
    let expected: Vec<String> = (1..=7).map(|i| format!("task-{i}")).collect();
    assert_eq!(seen, expected);
}
