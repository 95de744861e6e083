//! Settings supplied by the host application.
//!
//! API keys are handed to this crate, never stored or managed by it. A provider counts as
//! configured when its key is present and longer than [`MIN_KEY_LEN`] characters; nothing
//! beyond that length check is validated.

use crate::catalog::ProviderCatalog;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::Path;

pub const MIN_KEY_LEN: usize = 10;

/// Per-provider API keys.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.insert(provider, key);
        self
    }

    pub fn insert(&mut self, provider: impl Into<String>, key: impl Into<String>) {
        self.0.insert(provider.into(), key.into());
    }

    /// The key for `provider`, only if it is long enough to count as configured.
    pub fn usable_key(&self, provider: &str) -> Option<&str> {
        self.0
            .get(provider)
            .map(|k| k.trim())
            .filter(|k| k.len() > MIN_KEY_LEN)
    }

    pub fn is_configured(&self, provider: &str) -> bool {
        self.usable_key(provider).is_some()
    }

    pub fn configured_providers(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(|k| k.as_str())
            .filter(|p| self.is_configured(p))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (provider, key) in &self.0 {
            let shown = if key.trim().len() > MIN_KEY_LEN {
                "<redacted>"
            } else {
                "<unusable>"
            };
            map.entry(provider, &shown);
        }
        map.finish()
    }
}

/// HTTP transport knobs. Defaults are production-friendly and env-overridable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_secs: u64,
    pub proxy_url: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            pool_max_idle_per_host: 32,
            pool_idle_timeout_secs: 90,
            proxy_url: None,
        }
    }
}

impl HttpSettings {
    /// Apply `QUILL_HTTP_*` / `QUILL_PROXY_URL` overrides on top of the current values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<u64>("QUILL_HTTP_TIMEOUT_SECS") {
            self.timeout_secs = v;
        }
        if let Some(v) = env_parse::<usize>("QUILL_HTTP_POOL_MAX_IDLE_PER_HOST") {
            self.pool_max_idle_per_host = v;
        }
        if let Some(v) = env_parse::<u64>("QUILL_HTTP_POOL_IDLE_TIMEOUT_SECS") {
            self.pool_idle_timeout_secs = v;
        }
        if let Ok(proxy) = env::var("QUILL_PROXY_URL") {
            if !proxy.trim().is_empty() {
                self.proxy_url = Some(proxy);
            }
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Read-only settings collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_provider: Option<String>,
    pub default_model: Option<String>,
    pub api_keys: Credentials,
    pub http: HttpSettings,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = Some(provider.into());
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider, key);
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid settings: {}", e),
                ErrorContext::new().with_source("settings_loader"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_details(path.display().to_string()),
            },
            other => other,
        })
    }

    /// Fill gaps from the environment: `{PROVIDER}_API_KEY` for every catalog provider without
    /// a usable key, plus `QUILL_DEFAULT_PROVIDER` / `QUILL_DEFAULT_MODEL` when unset.
    pub fn with_env_overlay(mut self, catalog: &ProviderCatalog) -> Self {
        for provider in catalog.ids() {
            if self.api_keys.is_configured(provider) {
                continue;
            }
            let var = format!("{}_API_KEY", provider.to_uppercase());
            if let Ok(key) = env::var(&var) {
                self.api_keys.insert(provider, key);
            }
        }
        if self.default_provider.is_none() {
            self.default_provider = env::var("QUILL_DEFAULT_PROVIDER").ok();
        }
        if self.default_model.is_none() {
            self.default_model = env::var("QUILL_DEFAULT_MODEL").ok();
        }
        self.http = self.http.with_env_overrides();
        self
    }

    pub fn is_configured(&self, provider: &str) -> bool {
        self.api_keys.is_configured(provider)
    }
}
