mod circuit_breaker;
mod rate_limiter;
mod retry;
