//! Story client: the single entry point AI-assisted features call through.
//!
//! Keep the public surface small and predictable. Implementation details are split into
//! submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod failover;
pub mod types;

pub use builder::StoryClientBuilder;
pub use core::StoryClient;
pub use failover::{
    candidate_order, FailoverOrchestrator, ModelResolver, PreferredModelResolver, ProviderOutput,
};
pub use types::{CanonicalRequest, CanonicalResult, TemperaturePreset};
