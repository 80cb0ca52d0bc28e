//! Resilience and resource-governance core for MCP servers on
//! memory-constrained devices.
//!
//! This facade re-exports the whole workspace. Each concern also ships
//! as its own crate when only part of the stack is needed:
//!
//! - [`core`]: clock, RNG, delay primitive, event listeners
//! - [`ratelimiter`]: token bucket, global and per-key
//! - [`circuitbreaker`]: per-tool breakers with an LRU registry
//! - [`retry`]: backoff with four jitter strategies
//! - [`tasks`]: long-running task lifecycle
//! - [`sessions`]: concurrency caps and idle timeouts
//! - [`scheduler`] / [`watchdog`]: the cooperative tick
//! - [`store`]: K/V state with TTL
//! - [`eventlog`]: event and audit ring buffers
//! - [`rbac`]: key-to-role access control
//! - [`dispatch`]: the JSON-RPC pipeline tying it all together
//!
//! # Example
//!
//! ```
//! use picomcp::dispatch::{DispatcherConfig, Identity, Request, ToolEntry};
//! use picomcp::retry::Outcome;
//! use serde_json::json;
//!
//! let mut dispatcher = DispatcherConfig::builder().build();
//! dispatcher.register_tool(ToolEntry::sync("echo", |args| {
//!     Outcome::Success(args.clone())
//! }));
//!
//! let request = Request::new(1, "tools/call", json!({
//!     "name": "echo",
//!     "arguments": { "hello": "world" },
//! }));
//! let response = dispatcher.dispatch(&request, &Identity::anonymous());
//! assert!(response.is_success());
//! ```

pub use picomcp_circuitbreaker as circuitbreaker;
pub use picomcp_core as core;
pub use picomcp_dispatch as dispatch;
pub use picomcp_eventlog as eventlog;
pub use picomcp_ratelimiter as ratelimiter;
pub use picomcp_rbac as rbac;
pub use picomcp_retry as retry;
pub use picomcp_scheduler as scheduler;
pub use picomcp_sessions as sessions;
pub use picomcp_store as store;
pub use picomcp_tasks as tasks;
pub use picomcp_watchdog as watchdog;
