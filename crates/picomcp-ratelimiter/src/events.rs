use picomcp_core::RuntimeEvent;

/// Events emitted by the rate limiters.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A request was granted tokens.
    Allowed {
        limiter_name: String,
        at_ms: u32,
        key: Option<String>,
    },
    /// A request was denied for lack of tokens.
    Denied {
        limiter_name: String,
        at_ms: u32,
        key: Option<String>,
        retry_after_ms: u32,
    },
    /// A bucket was evicted from the keyed pool to make room.
    KeyEvicted {
        limiter_name: String,
        at_ms: u32,
        key: String,
    },
}

impl RuntimeEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::Allowed { .. } => "allowed",
            RateLimiterEvent::Denied { .. } => "denied",
            RateLimiterEvent::KeyEvicted { .. } => "key_evicted",
        }
    }

    fn at_ms(&self) -> u32 {
        match self {
            RateLimiterEvent::Allowed { at_ms, .. }
            | RateLimiterEvent::Denied { at_ms, .. }
            | RateLimiterEvent::KeyEvicted { at_ms, .. } => *at_ms,
        }
    }

    fn component(&self) -> &str {
        match self {
            RateLimiterEvent::Allowed { limiter_name, .. }
            | RateLimiterEvent::Denied { limiter_name, .. }
            | RateLimiterEvent::KeyEvicted { limiter_name, .. } => limiter_name,
        }
    }
}
