//! Resilience primitives: circuit breaker, retry-with-backoff, timeouts.
//!
//! These are deliberately small and dependency-light so every other crate in
//! the workspace can wrap its I/O (Postgres, Redis, subprocess, HTTP) with
//! the same failure-handling vocabulary.

pub mod breaker;
pub mod retry;
pub mod timeout;

pub use breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitMetrics, CircuitState};
pub use retry::{calculate_delay, with_retry, RetryConfig, RetryError};
pub use timeout::{with_timeout, TimeoutError};
