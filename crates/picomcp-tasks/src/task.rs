use serde::Serialize;

/// Status of a long-running task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// The handler is making progress.
    Working,
    /// The handler is blocked on further client input.
    InputRequired,
    /// Terminal: finished successfully.
    Completed,
    /// Terminal: finished with an error.
    Failed,
    /// Terminal: cancelled by the client.
    Cancelled,
}

impl TaskStatus {
    /// Returns true for `Completed`, `Failed`, and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// A long-running tool invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Monotonic id of the form `task-N`.
    pub id: String,
    pub status: TaskStatus,
    pub status_message: String,
    pub created_at: u32,
    pub last_updated_at: u32,
    /// Time-to-live in milliseconds; -1 means unlimited.
    pub ttl_ms: i64,
    /// Recommended client polling cadence.
    pub poll_interval_ms: u32,
    pub tool_name: String,
    /// Opaque result bytes, present once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<u8>>,
}
