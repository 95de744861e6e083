//! 弹性模块：按供应商隔离的熔断器。
//!
//! # Resilience Module
//!
//! Per-provider circuit breaking, so that one vendor's outage or rate limiting never costs
//! unrelated features a network round-trip.
//!
//! ## Circuit Breaker
//!
//! - **Closed**: normal operation, calls pass through
//! - **Open**: consecutive failures reached the threshold, calls are skipped without I/O
//!
//! After the cooldown elapses the circuit resets fully (failure count back to zero) on the
//! next check. There is no half-open single-probe state.
//!
//! ```rust
//! use quill_ai::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::new()
//!     .with_failure_threshold(3)
//!     .with_cooldown(Duration::from_secs(30));
//! let breaker = CircuitBreaker::new(config);
//!
//! if breaker.allow("openai") {
//!     // Make API call...
//!     breaker.record_success("openai");
//! }
//! ```

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot};
