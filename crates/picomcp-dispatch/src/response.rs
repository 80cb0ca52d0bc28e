use serde::Serialize;
use serde_json::Value;

/// Normative JSON-RPC error codes emitted by the dispatcher.
pub mod codes {
    /// Rate limited; `data.retryAfterMs` carries the recommended wait.
    pub const RATE_LIMITED: i32 = -32000;
    /// Circuit open; `data.retryAfterMs` carries the recommended wait.
    pub const CIRCUIT_OPEN: i32 = -32001;
    /// RBAC denied the call.
    pub const ACCESS_DENIED: i32 = -32002;
    /// The tool failed fatally or exhausted its retries.
    pub const TOOL_FAILED: i32 = -32010;
    /// A bounded pool refused the request (e.g. task pool full).
    pub const RESOURCE_EXHAUSTED: i32 = -32011;
    /// The request required a session that is missing or expired.
    pub const SESSION_INVALID: i32 = -32020;
    /// Unknown method and no registered tool by that name.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Malformed or missing parameters.
    pub const INVALID_PARAMS: i32 = -32602;
}

/// Error member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC response, success or error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl Response {
    /// A success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// An error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Returns true for success responses.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The error code, if this is an error response.
    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }
}
