//! 供应商目录：静态的供应商与模型元数据注册表。
//!
//! # Provider Catalog
//!
//! Static registry of the LLM providers this crate can talk to, their models, and per-model
//! metadata. The catalog carries no behavior beyond lookups; its enumeration order is the
//! failover order for every provider that is not the caller's preferred one.
//!
//! The first model listed for a provider is that provider's fallback model, used whenever the
//! provider is reached through failover rather than by explicit preference.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};

pub const OPENAI: &str = "openai";
pub const ANTHROPIC: &str = "anthropic";
pub const GEMINI: &str = "gemini";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub model_id: String,
    /// Relative cost in USD per 1k tokens (blended input/output, informational only).
    pub cost_per_1k_tokens: f64,
    pub max_context_tokens: u32,
}

impl ModelDescriptor {
    pub fn new(model_id: &str, cost_per_1k_tokens: f64, max_context_tokens: u32) -> Self {
        Self {
            model_id: model_id.into(),
            cost_per_1k_tokens,
            max_context_tokens,
        }
    }

    pub fn estimate_cost(&self, tokens: u32) -> f64 {
        (tokens as f64 / 1000.0) * self.cost_per_1k_tokens
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub display_name: String,
    pub models: Vec<ModelDescriptor>,
}

impl ProviderDescriptor {
    pub fn default_model(&self) -> Option<&ModelDescriptor> {
        self.models.first()
    }

    pub fn model(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.model_id == model_id)
    }
}

/// Ordered, immutable provider registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCatalog {
    providers: Vec<ProviderDescriptor>,
}

static BUILTIN: once_cell::sync::Lazy<ProviderCatalog> = once_cell::sync::Lazy::new(|| {
    ProviderCatalog {
        providers: vec![
            ProviderDescriptor {
                id: OPENAI.into(),
                display_name: "OpenAI".into(),
                models: vec![
                    ModelDescriptor::new("gpt-4o-mini", 0.00038, 128_000),
                    ModelDescriptor::new("gpt-4o", 0.01, 128_000),
                    ModelDescriptor::new("gpt-4-turbo", 0.02, 128_000),
                ],
            },
            ProviderDescriptor {
                id: ANTHROPIC.into(),
                display_name: "Anthropic".into(),
                models: vec![
                    ModelDescriptor::new("claude-3-5-sonnet-20241022", 0.009, 200_000),
                    ModelDescriptor::new("claude-3-5-haiku-20241022", 0.0024, 200_000),
                    ModelDescriptor::new("claude-3-opus-20240229", 0.045, 200_000),
                ],
            },
            ProviderDescriptor {
                id: GEMINI.into(),
                display_name: "Google Gemini".into(),
                models: vec![
                    ModelDescriptor::new("gemini-1.5-flash", 0.00019, 1_000_000),
                    ModelDescriptor::new("gemini-1.5-pro", 0.0031, 2_000_000),
                ],
            },
        ],
    }
});

impl ProviderCatalog {
    /// The built-in catalog: OpenAI, Anthropic, Gemini, in that order.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Build a catalog from descriptors. Duplicate or model-less providers are rejected.
    pub fn new(providers: Vec<ProviderDescriptor>) -> Result<Self> {
        for (i, p) in providers.iter().enumerate() {
            if p.models.is_empty() {
                return Err(Error::configuration_with_context(
                    format!("provider '{}' lists no models", p.id),
                    ErrorContext::new()
                        .with_field_path(format!("providers[{}].models", i))
                        .with_source("provider_catalog"),
                ));
            }
            if providers[..i].iter().any(|other| other.id == p.id) {
                return Err(Error::configuration_with_context(
                    format!("provider '{}' listed twice", p.id),
                    ErrorContext::new()
                        .with_field_path(format!("providers[{}].id", i))
                        .with_source("provider_catalog"),
                ));
            }
        }
        Ok(Self { providers })
    }

    /// Load a catalog from YAML (`providers: [{id, display_name, models: [...]}]`).
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let parsed: ProviderCatalog = serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid provider catalog: {}", e),
                ErrorContext::new().with_source("provider_catalog"),
            )
        })?;
        Self::new(parsed.providers)
    }

    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Provider ids in fixed enumeration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.id.as_str())
    }

    pub fn provider(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.provider(id).is_some()
    }

    /// First listed model id for a provider.
    pub fn default_model(&self, provider: &str) -> Option<&str> {
        self.provider(provider)
            .and_then(|p| p.default_model())
            .map(|m| m.model_id.as_str())
    }

    pub fn model(&self, provider: &str, model_id: &str) -> Option<&ModelDescriptor> {
        self.provider(provider).and_then(|p| p.model(model_id))
    }

    pub fn estimate_cost(&self, provider: &str, model_id: &str, tokens: u32) -> Option<f64> {
        self.model(provider, model_id).map(|m| m.estimate_cost(tokens))
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
