use serde::Deserialize;
use serde_json::Value;

/// A parsed JSON-RPC request.
///
/// The wire layer owns framing and parsing; the core consumes the
/// `(id, method, params)` tuple.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    /// Request id echoed back in the response.
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// Convenience constructor for embedding layers and tests.
    pub fn new(id: impl Into<Value>, method: &str, params: Value) -> Self {
        Self {
            id: id.into(),
            method: method.to_string(),
            params,
        }
    }
}

/// Caller identity attached to a request by the transport.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub api_key: Option<String>,
    pub session_id: Option<String>,
}

impl Identity {
    /// An unauthenticated, session-less caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Identity carrying an API key.
    pub fn with_key(api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            session_id: None,
        }
    }

    /// Attaches a session id.
    pub fn session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    /// Label used for rate keys and audit actors.
    pub fn actor(&self) -> &str {
        self.api_key
            .as_deref()
            .or(self.session_id.as_deref())
            .unwrap_or("anonymous")
    }
}
