use picomcp_retry::{Outcome, RetryableError};
use serde_json::Value;

/// A synchronous tool body: takes the argument object, classifies its
/// own outcome.
pub type SyncHandler = Box<dyn FnMut(&Value) -> Outcome<Value> + Send>;

/// Starts a long-running tool invocation bound to a task id. The
/// handler is expected to drive the task to a terminal state (or to
/// `InputRequired`) from scheduler callbacks.
pub type TaskStarter = Box<dyn FnMut(&Value, &str) -> Result<(), RetryableError> + Send>;

/// A registered tool body: either synchronous or long-running.
///
/// Tool state lives behind these closures as explicit captures, never
/// as process globals; the dispatcher treats both shapes as opaque.
pub enum ToolHandler {
    /// Runs inline under the retry executor.
    Sync(SyncHandler),
    /// Runs via the task manager; clients poll for completion.
    LongRunning {
        start: TaskStarter,
        /// Recommended client polling cadence returned on creation.
        poll_interval_ms: u32,
    },
}

/// A tool registration: the handler plus its dispatch flags.
pub struct ToolEntry {
    pub(crate) name: String,
    pub(crate) handler: ToolHandler,
    pub(crate) requires_session: bool,
    /// Named retry policy; the dispatcher default applies when `None`.
    pub(crate) retry_policy: Option<String>,
}

impl ToolEntry {
    /// A synchronous tool.
    pub fn sync<F>(name: &str, handler: F) -> Self
    where
        F: FnMut(&Value) -> Outcome<Value> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            handler: ToolHandler::Sync(Box::new(handler)),
            requires_session: false,
            retry_policy: None,
        }
    }

    /// A long-running tool with the given polling recommendation.
    pub fn long_running<F>(name: &str, poll_interval_ms: u32, start: F) -> Self
    where
        F: FnMut(&Value, &str) -> Result<(), RetryableError> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            handler: ToolHandler::LongRunning {
                start: Box::new(start),
                poll_interval_ms,
            },
            requires_session: false,
            retry_policy: None,
        }
    }

    /// Requires a valid session before the tool may run.
    pub fn requires_session(mut self, required: bool) -> Self {
        self.requires_session = required;
        self
    }

    /// Runs the tool under the named retry policy instead of the
    /// dispatcher default.
    pub fn retry_policy(mut self, name: &str) -> Self {
        self.retry_policy = Some(name.to_string());
        self
    }

    /// The tool's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The table of registered tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolEntry>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any previous entry with the same
    /// name.
    pub fn register(&mut self, entry: ToolEntry) {
        self.tools.retain(|t| t.name != entry.name);
        self.tools.push(entry);
    }

    /// Looks up a tool by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ToolEntry> {
        self.tools.iter_mut().find(|t| t.name == name)
    }

    /// Returns true if a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true when no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
