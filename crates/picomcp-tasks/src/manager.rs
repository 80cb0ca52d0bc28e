use crate::error::TaskError;
use crate::task::{Task, TaskStatus};
use picomcp_core::SharedClock;
use serde::Serialize;
use std::collections::VecDeque;

/// Default recommended polling cadence for new tasks.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 500;

/// Point-in-time view of the task pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskManagerStats {
    pub task_count: usize,
    pub active_count: usize,
    pub terminal_count: usize,
    pub max_tasks: usize,
    pub created: u64,
    pub evicted: u64,
}

/// One page of a task listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    /// Offset of the next page; 0 when the listing is exhausted.
    pub next_offset: u32,
}

/// Owns every live and recently finished task.
///
/// Tasks are kept in insertion order. The pool tolerates up to
/// `2 * max_tasks` records before evicting terminal tasks FIFO; live
/// tasks are never evicted.
pub struct TaskManager {
    tasks: VecDeque<Task>,
    next_id: u64,
    max_tasks: usize,
    clock: SharedClock,
    created: u64,
    evicted: u64,
}

impl TaskManager {
    /// Creates a manager bounded at `max_tasks` live tasks.
    pub fn new(max_tasks: usize, clock: SharedClock) -> Self {
        Self {
            tasks: VecDeque::new(),
            next_id: 1,
            max_tasks: max_tasks.max(1),
            clock,
            created: 0,
            evicted: 0,
        }
    }

    /// Creates a task in `Working` state and returns its id.
    ///
    /// `ttl_ms` of -1 means unlimited. Fails with
    /// [`TaskError::PoolFull`] when the pool is over its ceiling and
    /// no terminal task can be evicted.
    pub fn create_task(
        &mut self,
        tool_name: &str,
        ttl_ms: i64,
        poll_interval_ms: u32,
    ) -> Result<String, TaskError> {
        self.make_room()?;

        let now = self.clock.now_ms();
        let id = format!("task-{}", self.next_id);
        self.next_id += 1;
        self.tasks.push_back(Task {
            id: id.clone(),
            status: TaskStatus::Working,
            status_message: String::new(),
            created_at: now,
            last_updated_at: now,
            ttl_ms,
            poll_interval_ms,
            tool_name: tool_name.to_string(),
            result: None,
        });
        self.created += 1;

        #[cfg(feature = "tracing")]
        tracing::debug!(task = %id, tool = tool_name, "task created");

        Ok(id)
    }

    /// Evicts terminal tasks in insertion order until the pool can take
    /// one more record; refuses when only live tasks remain.
    fn make_room(&mut self) -> Result<(), TaskError> {
        let ceiling = 2 * self.max_tasks;
        while self.tasks.len() + 1 > ceiling {
            let Some(index) = self.tasks.iter().position(|t| t.status.is_terminal()) else {
                return Err(TaskError::PoolFull);
            };
            let evicted = self.tasks.remove(index);
            self.evicted += 1;
            #[cfg(feature = "tracing")]
            if let Some(task) = &evicted {
                tracing::debug!(task = %task.id, "evicted terminal task");
            }
            #[cfg(not(feature = "tracing"))]
            drop(evicted);
        }
        Ok(())
    }

    /// Returns the task with the given id.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Moves a live task to a new status, stamping `last_updated_at`.
    ///
    /// Returns false (mutating nothing) when the task is unknown or
    /// already terminal.
    pub fn update_status(&mut self, id: &str, status: TaskStatus, message: &str) -> bool {
        let now = self.clock.now_ms();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if task.status.is_terminal() {
            return false;
        }
        task.status = status;
        task.status_message = message.to_string();
        task.last_updated_at = now;
        #[cfg(feature = "tracing")]
        tracing::debug!(task = %id, status = ?status, "task status updated");
        true
    }

    /// Completes a live task with an opaque result.
    pub fn complete_task(&mut self, id: &str, result: Vec<u8>) -> bool {
        let now = self.clock.now_ms();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if task.status.is_terminal() {
            return false;
        }
        task.status = TaskStatus::Completed;
        task.result = Some(result);
        task.last_updated_at = now;
        true
    }

    /// Fails a live task with a message.
    pub fn fail_task(&mut self, id: &str, message: &str) -> bool {
        self.update_status(id, TaskStatus::Failed, message)
    }

    /// Cancels a live task.
    ///
    /// Cancellation is advisory: the handler observes the terminal
    /// state at its next cooperative yield and stops doing work.
    pub fn cancel_task(&mut self, id: &str) -> bool {
        self.update_status(id, TaskStatus::Cancelled, "cancelled")
    }

    /// Returns a page of tasks starting at `start`, and the offset of
    /// the next page (0 when exhausted).
    pub fn list_tasks(&self, start: usize, page_size: usize) -> TaskPage {
        let page_size = page_size.max(1);
        let tasks: Vec<Task> = self
            .tasks
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();
        let end = start + tasks.len();
        let next_offset = if end < self.tasks.len() { end as u32 } else { 0 };
        TaskPage { tasks, next_offset }
    }

    /// Number of stored tasks, live and terminal.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true when no tasks are stored.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns a snapshot of the pool.
    pub fn stats(&self) -> TaskManagerStats {
        let terminal = self.tasks.iter().filter(|t| t.status.is_terminal()).count();
        TaskManagerStats {
            task_count: self.tasks.len(),
            active_count: self.tasks.len() - terminal,
            terminal_count: terminal,
            max_tasks: self.max_tasks,
            created: self.created,
            evicted: self.evicted,
        }
    }
}
