use std::sync::Arc;
use tracing::debug;

use crate::cache::{CacheStats, Cached, ResponseCache};
use crate::catalog::ProviderCatalog;
use crate::client::builder::StoryClientBuilder;
use crate::client::failover::{
    candidate_order, FailoverOrchestrator, PreferredModelResolver, ProviderOutput,
};
use crate::client::types::{CanonicalRequest, CanonicalResult, TemperaturePreset};
use crate::config::Settings;
use crate::features::{FeatureOutput, FeatureRequest};
use crate::pipeline::{CoWriteOutput, CoWritePipeline, CoWriteRequest};
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerSnapshot};
use crate::structured::parse_items;
use crate::Result;

/// Entry point for every AI-assisted feature: owns the settings, catalog, breaker, cache and
/// failover orchestrator for one application.
pub struct StoryClient {
    pub(crate) settings: Settings,
    pub(crate) catalog: Arc<ProviderCatalog>,
    pub(crate) orchestrator: FailoverOrchestrator,
    pub(crate) breaker: Arc<CircuitBreaker>,
    pub(crate) cache: Arc<ResponseCache>,
}

impl std::fmt::Debug for StoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryClient")
            .field("settings", &self.settings)
            .field("providers", &self.catalog.ids().collect::<Vec<_>>())
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl StoryClient {
    pub fn builder() -> StoryClientBuilder {
        StoryClientBuilder::new()
    }

    /// Client configured from `{PROVIDER}_API_KEY` and the `QUILL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let settings = Settings::new().with_env_overlay(&ProviderCatalog::builtin());
        StoryClientBuilder::new().settings(settings).build()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Send one prompt through failover and return the raw text. Never cached.
    pub async fn generate(&self, request: &CanonicalRequest) -> Result<CanonicalResult> {
        let out = self.generate_parsed(request, |_| Ok(())).await?;
        Ok(CanonicalResult {
            raw_text: out.raw_text,
            provider_used: out.provider_used,
            model_used: out.model_used,
            served_from_cache: false,
        })
    }

    /// Shorthand for [`generate`](Self::generate) with default provider and token limits.
    pub async fn request(
        &self,
        prompt: impl Into<String>,
        preset: TemperaturePreset,
    ) -> Result<CanonicalResult> {
        self.generate(&CanonicalRequest::new(prompt).with_preset(preset))
            .await
    }

    /// Run a read-style feature: cache, then failover with structured parsing. A parse
    /// failure moves on to the next provider like any other provider failure.
    pub async fn run_feature<R: FeatureRequest + ?Sized>(
        &self,
        request: &R,
    ) -> Result<Cached<FeatureOutput>> {
        let key = request.cache_key();
        let schema = request.schema();
        self.cache
            .get_or_compute(&key, || async move {
                let canonical = CanonicalRequest::new(request.prompt())
                    .with_preset(request.preset())
                    .with_max_output_tokens(request.max_tokens());
                let out = self
                    .generate_parsed(&canonical, |text| parse_items(text, schema))
                    .await?;
                debug!(
                    feature = request.feature(),
                    items = out.value.len(),
                    provider = out.provider_used.as_str(),
                    "feature parsed"
                );
                Ok(FeatureOutput {
                    items: out.value,
                    provider_used: out.provider_used,
                    model_used: out.model_used,
                })
            })
            .await
    }

    /// Run the Plan → Decompose → Elaborate co-writing pipeline.
    pub async fn co_write(&self, request: &CoWriteRequest) -> Result<CoWriteOutput> {
        CoWritePipeline::new(self).run(request).await
    }

    pub fn circuit_snapshot(&self, provider: &str) -> CircuitBreakerSnapshot {
        self.breaker.snapshot(provider)
    }

    /// Snapshots for every catalog provider, in catalog order.
    pub fn circuit_snapshots(&self) -> Vec<CircuitBreakerSnapshot> {
        self.catalog
            .ids()
            .map(|id| self.breaker.snapshot(id))
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resolve preferences (request first, then settings) and run failover with `parse`.
    pub(crate) async fn generate_parsed<T, P>(
        &self,
        request: &CanonicalRequest,
        parse: P,
    ) -> Result<ProviderOutput<T>>
    where
        P: Fn(&str) -> Result<T> + Send + Sync,
    {
        let default_provider = self.settings.default_provider.as_deref();
        let provider = request.preferred_provider.as_deref().or(default_provider);
        // The settings' default model only belongs to the settings' default provider.
        let model = request.preferred_model.as_deref().or_else(|| {
            (provider.is_some() && provider == default_provider)
                .then_some(self.settings.default_model.as_deref())
                .flatten()
        });
        let candidates = candidate_order(provider, &self.catalog);
        let resolver = PreferredModelResolver::new(&self.catalog, provider, model);
        self.orchestrator
            .call_with(
                &candidates,
                &resolver,
                &request.prompt_text,
                request.temperature,
                request.max_output_tokens,
                &self.settings.api_keys,
                parse,
            )
            .await
    }
}
