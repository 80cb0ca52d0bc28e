//! Request dispatch for picomcp.
//!
//! The [`Dispatcher`] is the root context of the runtime: it owns every
//! governance component and pushes each parsed JSON-RPC request through
//! the fixed pipeline
//!
//! ```text
//! session -> RBAC -> rate limit -> circuit breaker -> retry(handler)
//!         -> breaker record -> audit + event
//! ```
//!
//! Policy denials (session, RBAC, rate, breaker) are typed JSON-RPC
//! errors with normative codes and never count against the breaker's
//! failure threshold. Long-running tools take the task path: the
//! pipeline runs up to the breaker, a task record is created, and the
//! handler drives it to a terminal state asynchronously while clients
//! poll `tasks/get`.

mod config;
mod dispatcher;
mod error;
mod handler;
mod request;
mod response;

pub use config::{DispatcherConfig, DispatcherConfigBuilder};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use handler::{SyncHandler, TaskStarter, ToolEntry, ToolHandler, ToolRegistry};
pub use request::{Identity, Request};
pub use response::{codes, Response, ResponseError};
