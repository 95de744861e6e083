use std::sync::Arc;
use tracing::warn;

use crate::cache::{CacheConfig, ResponseCache};
use crate::catalog::ProviderCatalog;
use crate::client::core::StoryClient;
use crate::client::failover::FailoverOrchestrator;
use crate::clock::{self, Clock};
use crate::config::Settings;
use crate::drivers::{DriverRegistry, ProviderDriver};
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::transport::{HttpTransport, Transport};
use crate::Result;

/// Builder for [`StoryClient`].
///
/// Everything has a default: the built-in catalog, the three built-in drivers, an
/// [`HttpTransport`] from `settings.http`, the system clock, a 3-failure / 30 s breaker and a
/// 5-minute cache.
pub struct StoryClientBuilder {
    settings: Settings,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    catalog: Option<ProviderCatalog>,
    breaker_config: CircuitBreakerConfig,
    cache_config: CacheConfig,
    extra_drivers: Vec<Arc<dyn ProviderDriver>>,
    /// Override base URLs per provider (primarily for testing with mock servers)
    base_url_overrides: Vec<(String, String)>,
}

impl Default for StoryClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryClientBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            transport: None,
            clock: None,
            catalog: None,
            breaker_config: CircuitBreakerConfig::default(),
            cache_config: CacheConfig::default(),
            extra_drivers: Vec::new(),
            base_url_overrides: Vec::new(),
        }
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the network collaborator (scripted transports in tests).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Time source shared by the breaker and the cache.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn catalog(mut self, catalog: ProviderCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn breaker_config(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker_config = config;
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Register an additional driver (or replace a built-in one with the same id).
    pub fn driver(mut self, driver: Arc<dyn ProviderDriver>) -> Self {
        self.extra_drivers.push(driver);
        self
    }

    /// Point one provider at a different host.
    ///
    /// This is primarily for testing with mock servers and for proxies.
    pub fn base_url_override(
        mut self,
        provider: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        self.base_url_overrides
            .push((provider.into(), base_url.into()));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<StoryClient> {
        let clock = self.clock.unwrap_or_else(clock::system);
        let catalog = Arc::new(self.catalog.unwrap_or_default());

        let mut drivers = DriverRegistry::with_defaults();
        for driver in self.extra_drivers {
            drivers.register(driver);
        }
        for (provider, base_url) in &self.base_url_overrides {
            drivers.override_base_url(provider, base_url)?;
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&self.settings.http)?),
        };

        if let Some(p) = self.settings.default_provider.as_deref() {
            if !drivers.contains(p) {
                warn!(provider = p, "default provider has no registered driver");
            }
        }
        if catalog.ids().all(|id| !self.settings.is_configured(id)) {
            warn!("no provider has a usable API key; AI features will fail until one is set");
        }

        let breaker = Arc::new(CircuitBreaker::with_clock(
            self.breaker_config,
            clock.clone(),
        ));
        let cache = Arc::new(ResponseCache::with_clock(self.cache_config, clock));
        let orchestrator =
            FailoverOrchestrator::new(Arc::new(drivers), transport, breaker.clone());

        Ok(StoryClient {
            settings: self.settings,
            catalog,
            orchestrator,
            breaker,
            cache,
        })
    }
}
