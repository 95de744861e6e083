//! 响应缓存模块：以语义签名为键、带 TTL 的结果记忆，避免重复计费调用。
//!
//! # Response Caching Module
//!
//! TTL-bounded memoization in front of the failover orchestrator for idempotent, read-style
//! features (idea generation, consistency checks, analyses).
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | `get_or_compute` with TTL, stats and lazy expiry |
//! | [`CacheConfig`] | TTL (default 5 minutes), entry bound, on/off switch |
//! | [`CacheKeyGenerator`] | Feature name + truncated, normalised fields, hashed |
//! | [`MemoryCache`] | The in-memory entry store |
//!
//! ## Example
//!
//! ```rust
//! use quill_ai::cache::{CacheConfig, CacheKeyGenerator, ResponseCache};
//!
//! # async fn demo() -> quill_ai::Result<()> {
//! let cache = ResponseCache::new(CacheConfig::default());
//! let key = CacheKeyGenerator::new("ideas")
//!     .field("entity", "Mara Vell")
//!     .field("description", "A smuggler with a debt to the wrong people")
//!     .build();
//! let result = cache.get_or_compute(&key, || async { Ok(vec!["idea".to_string()]) }).await?;
//! assert!(!result.served_from_cache);
//! # Ok(())
//! # }
//! ```
//!
//! A hit never touches providers or the circuit breaker.

mod backend;
mod key;
mod manager;

pub use backend::MemoryCache;
pub use key::{CacheKey, CacheKeyGenerator, DEFAULT_FIELD_CHARS};
pub use manager::{CacheConfig, CacheStats, Cached, ResponseCache};
