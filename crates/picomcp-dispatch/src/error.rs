use crate::response::{codes, Response};
use serde_json::{json, Value};
use thiserror::Error;

/// Typed rejection produced by the dispatch pipeline.
///
/// Each variant identifies the subsystem responsible and maps to a
/// normative JSON-RPC error code; the pipeline never unwinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The request required a session that is missing or expired.
    #[error("session missing or expired")]
    SessionInvalid,

    /// RBAC denied the caller access to the tool.
    #[error("access denied for tool {tool:?}")]
    AccessDenied { tool: String },

    /// The rate limiter had no tokens for the caller.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u32 },

    /// The tool's circuit breaker is open.
    #[error("circuit open for tool {tool:?}; retry after {retry_after_ms} ms")]
    CircuitOpen { tool: String, retry_after_ms: u32 },

    /// The tool failed fatally or exhausted its retries.
    #[error("tool failed: {message}")]
    ToolFailed { message: String },

    /// The task pool is full of live tasks.
    #[error("task pool full")]
    TaskPoolFull,

    /// No method or registered tool by that name.
    #[error("method not found: {method:?}")]
    MethodNotFound { method: String },

    /// Malformed or missing parameters.
    #[error("invalid params: {message}")]
    InvalidParams { message: String },
}

impl DispatchError {
    /// The JSON-RPC error code for this rejection.
    pub fn code(&self) -> i32 {
        match self {
            DispatchError::SessionInvalid => codes::SESSION_INVALID,
            DispatchError::AccessDenied { .. } => codes::ACCESS_DENIED,
            DispatchError::RateLimited { .. } => codes::RATE_LIMITED,
            DispatchError::CircuitOpen { .. } => codes::CIRCUIT_OPEN,
            DispatchError::ToolFailed { .. } => codes::TOOL_FAILED,
            DispatchError::TaskPoolFull => codes::RESOURCE_EXHAUSTED,
            DispatchError::MethodNotFound { .. } => codes::METHOD_NOT_FOUND,
            DispatchError::InvalidParams { .. } => codes::INVALID_PARAMS,
        }
    }

    /// Structured data attached to the error member, when meaningful.
    pub fn data(&self) -> Option<Value> {
        match self {
            DispatchError::RateLimited { retry_after_ms }
            | DispatchError::CircuitOpen { retry_after_ms, .. } => {
                Some(json!({ "retryAfterMs": retry_after_ms }))
            }
            _ => None,
        }
    }

    /// Converts the rejection into a JSON-RPC error response.
    pub fn into_response(self, id: Value) -> Response {
        let data = self.data();
        let message = self.to_string();
        Response::error(id, self.code(), message, data)
    }
}
