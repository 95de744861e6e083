//! # quill-ai
//!
//! 面向 AI 辅助创意写作的多厂商大模型编排核心：熔断、故障转移、响应缓存与结构化输出。
//!
//! Resilient LLM orchestration core for a creative-writing tool. Every AI-assisted feature
//! (idea generation, consistency checks, ripple-effect analysis, scene planning, voice
//! samples, chapter blueprints, co-writing, pacing and theme analysis) calls through this
//! crate to interchangeable providers.
//!
//! ## Overview
//!
//! - **Failover**: candidates are tried in a deterministic order (preferred provider, then
//!   the catalog order); per-provider failures never reach the caller unless every
//!   candidate fails.
//! - **Circuit breaking**: three consecutive failures open a provider's circuit for 30
//!   seconds, after which it fully resets.
//! - **Memoization**: read-style features are cached for five minutes under a hashed key.
//! - **Structured output**: fenced JSON is extracted and closed enum fields are coerced to
//!   documented defaults instead of failing.
//! - **Pipelines**: Plan → Decompose → Elaborate co-writing with a rolling prose window.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quill_ai::features::IdeaRequest;
//! use quill_ai::{Settings, StoryClient, TemperaturePreset};
//!
//! #[tokio::main]
//! async fn main() -> quill_ai::Result<()> {
//!     let client = StoryClient::builder()
//!         .settings(Settings::new().with_api_key("anthropic", "sk-ant-your-key-here"))
//!         .build()?;
//!
//!     let text = client.request("Name three smugglers.", TemperaturePreset::Creative).await?;
//!     println!("{} said: {}", text.provider_used, text.raw_text);
//!
//!     let ideas = client
//!         .run_feature(&IdeaRequest::new("Mara Vell", "character", "A smuggler in debt"))
//!         .await?;
//!     for idea in &ideas.value.items {
//!         println!("- {} ({})", idea.str("title"), idea.str("category"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalog`] | Providers, their models and static costs |
//! | [`resilience`] | Per-provider circuit breaker |
//! | [`drivers`] | Wire adapters for OpenAI, Anthropic and Gemini |
//! | [`transport`] | Network collaborator (reqwest) |
//! | [`client`] | Failover orchestrator and the [`StoryClient`] facade |
//! | [`cache`] | TTL response cache |
//! | [`structured`] | JSON extraction and enum coercion |
//! | [`features`] | Read-style feature requests |
//! | [`pipeline`] | Co-writing pipeline |
//! | [`config`] | Settings and credentials |
//! | [`clock`] | Time source |

pub mod cache;
pub mod catalog;
pub mod client;
pub mod clock;
pub mod config;
pub mod drivers;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod resilience;
pub mod structured;
pub mod transport;

// Re-export main types for convenience
pub use cache::{CacheConfig, CacheStats, Cached};
pub use catalog::ProviderCatalog;
pub use client::{
    CanonicalRequest, CanonicalResult, StoryClient, StoryClientBuilder, TemperaturePreset,
};
pub use config::{Credentials, Settings};
pub use error::{Error, ErrorContext};
pub use features::{FeatureOutput, FeatureRequest};
pub use pipeline::{CoWriteOptions, CoWriteOutput, CoWriteRequest};
pub use resilience::{CircuitBreakerConfig, CircuitBreakerSnapshot};
pub use structured::StructuredItem;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
