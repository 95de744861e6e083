//! 故障转移编排：按确定顺序逐个尝试候选提供商，熔断器把关，任一成功即返回。
//!
//! Failover orchestration (single call, multiple candidates).
//!
//! Every per-provider problem (circuit open, HTTP error, unreadable body, unparseable
//! structured output, connection failure) is absorbed here and the next candidate is tried.
//! Callers only see an error once every candidate has been exhausted.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::ProviderCatalog;
use crate::client::types::CanonicalResult;
use crate::config::Credentials;
use crate::drivers::{DriverRegistry, ProviderDriver};
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::transport::Transport;
use crate::{Error, Result};

/// Deterministic attempt order: the preferred provider first (when set), then the remaining
/// catalog providers in enumeration order. Each provider appears at most once.
pub fn candidate_order(preferred: Option<&str>, catalog: &ProviderCatalog) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(catalog.providers().len() + 1);
    if let Some(p) = preferred.map(str::trim).filter(|p| !p.is_empty()) {
        order.push(p.to_string());
    }
    for id in catalog.ids() {
        if !order.iter().any(|o| o == id) {
            order.push(id.to_string());
        }
    }
    order
}

/// Picks the model to use for a given candidate provider.
pub trait ModelResolver: Send + Sync {
    fn resolve(&self, provider: &str) -> Option<String>;
}

impl<F> ModelResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn resolve(&self, provider: &str) -> Option<String> {
        self(provider)
    }
}

/// The caller's model for the preferred provider, the catalog's fallback model for the rest.
#[derive(Debug, Clone, Copy)]
pub struct PreferredModelResolver<'a> {
    catalog: &'a ProviderCatalog,
    preferred_provider: Option<&'a str>,
    preferred_model: Option<&'a str>,
}

impl<'a> PreferredModelResolver<'a> {
    pub fn new(
        catalog: &'a ProviderCatalog,
        preferred_provider: Option<&'a str>,
        preferred_model: Option<&'a str>,
    ) -> Self {
        Self {
            catalog,
            preferred_provider,
            preferred_model,
        }
    }
}

impl ModelResolver for PreferredModelResolver<'_> {
    fn resolve(&self, provider: &str) -> Option<String> {
        if self.preferred_provider == Some(provider) {
            if let Some(model) = self.preferred_model.filter(|m| !m.trim().is_empty()) {
                return Some(model.to_string());
            }
        }
        self.catalog.default_model(provider).map(str::to_string)
    }
}

/// A parsed value together with the raw text and the provider/model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutput<T> {
    pub value: T,
    pub raw_text: String,
    pub provider_used: String,
    pub model_used: String,
}

/// Iterates candidates, gated by the shared circuit breaker.
#[derive(Clone)]
pub struct FailoverOrchestrator {
    drivers: Arc<DriverRegistry>,
    transport: Arc<dyn Transport>,
    breaker: Arc<CircuitBreaker>,
}

impl std::fmt::Debug for FailoverOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailoverOrchestrator")
            .field("drivers", &self.drivers)
            .field("breaker", &self.breaker)
            .finish_non_exhaustive()
    }
}

impl FailoverOrchestrator {
    pub fn new(
        drivers: Arc<DriverRegistry>,
        transport: Arc<dyn Transport>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            drivers,
            transport,
            breaker,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn drivers(&self) -> &Arc<DriverRegistry> {
        &self.drivers
    }

    /// Return raw text from the first candidate that answers successfully.
    pub async fn call(
        &self,
        candidates: &[String],
        resolver: &dyn ModelResolver,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        credentials: &Credentials,
    ) -> Result<CanonicalResult> {
        let out = self
            .call_with(
                candidates,
                resolver,
                prompt,
                temperature,
                max_tokens,
                credentials,
                |_| Ok(()),
            )
            .await?;
        Ok(CanonicalResult {
            raw_text: out.raw_text,
            provider_used: out.provider_used,
            model_used: out.model_used,
            served_from_cache: false,
        })
    }

    /// Like [`call`](Self::call), but `parse` must also accept the text. A parse failure is
    /// recorded against the provider and the next candidate is tried.
    #[allow(clippy::too_many_arguments)]
    pub async fn call_with<T, P>(
        &self,
        candidates: &[String],
        resolver: &dyn ModelResolver,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        credentials: &Credentials,
        parse: P,
    ) -> Result<ProviderOutput<T>>
    where
        P: Fn(&str) -> Result<T> + Send + Sync,
    {
        let mut last_error: Option<Error> = None;

        for provider in candidates {
            let provider = provider.as_str();
            let Some(api_key) = credentials.usable_key(provider) else {
                debug!(provider, "skipping provider without usable credentials");
                continue;
            };
            let Some(model) = resolver.resolve(provider) else {
                debug!(provider, "skipping provider without a resolvable model");
                continue;
            };
            let Some(driver) = self.drivers.get(provider) else {
                debug!(provider, "skipping provider without a registered driver");
                continue;
            };
            if let Err(open) = self.breaker.check(provider) {
                info!(provider, error = %open, "circuit open, skipping provider");
                last_error = Some(open);
                continue;
            }

            let started = std::time::Instant::now();
            match self
                .attempt(
                    driver.as_ref(),
                    &model,
                    prompt,
                    temperature,
                    max_tokens,
                    api_key,
                    &parse,
                )
                .await
            {
                Ok((raw_text, value)) => {
                    self.breaker.record_success(provider);
                    info!(
                        provider,
                        model = model.as_str(),
                        latency_ms = started.elapsed().as_millis() as u64,
                        "provider call succeeded"
                    );
                    return Ok(ProviderOutput {
                        value,
                        raw_text,
                        provider_used: provider.to_string(),
                        model_used: model,
                    });
                }
                Err(e) => {
                    self.breaker.record_failure(provider);
                    warn!(
                        provider,
                        model = model.as_str(),
                        error = %e,
                        "provider call failed, trying next candidate"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(Error::NoProviderConfigured))
    }

    #[allow(clippy::too_many_arguments)]
    async fn attempt<T, P>(
        &self,
        driver: &dyn ProviderDriver,
        model: &str,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        api_key: &str,
        parse: &P,
    ) -> Result<(String, T)>
    where
        P: Fn(&str) -> Result<T> + Send + Sync,
    {
        let request = driver.build_request(model, prompt, temperature, max_tokens, api_key)?;
        let response = self.transport.send(&request).await?;
        let text = driver.extract_text(response.status, &response.body)?;
        let value = parse(&text)?;
        Ok((text, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ANTHROPIC, GEMINI, OPENAI};
    use crate::drivers::DriverRequest;
    use crate::transport::TransportResponse;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubTransport {
        replies: Mutex<HashMap<String, VecDeque<TransportResponse>>>,
        sent: Mutex<Vec<String>>,
    }

    impl StubTransport {
        fn reply(self, provider: &str, status: u16, body: &str) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry(provider.to_string())
                .or_default()
                .push_back(TransportResponse::new(status, body));
            self
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: &DriverRequest) -> Result<TransportResponse> {
            self.sent.lock().unwrap().push(request.provider.clone());
            Ok(self
                .replies
                .lock()
                .unwrap()
                .get_mut(&request.provider)
                .and_then(|q| q.pop_front())
                .unwrap_or_else(|| TransportResponse::new(500, "{}")))
        }
    }

    const KEY: &str = "sk-test-0123456789";
    const OPENAI_OK: &str = r#"{"choices":[{"message":{"content":"from openai"}}]}"#;
    const ANTHROPIC_OK: &str = r#"{"content":[{"type":"text","text":"from anthropic"}]}"#;
    const GEMINI_OK: &str =
        r#"{"candidates":[{"content":{"parts":[{"text":"from gemini"}]}}]}"#;

    fn orchestrator(transport: Arc<StubTransport>) -> (FailoverOrchestrator, Arc<CircuitBreaker>) {
        let breaker = Arc::new(CircuitBreaker::default());
        let orch = FailoverOrchestrator::new(
            Arc::new(DriverRegistry::with_defaults()),
            transport,
            breaker.clone(),
        );
        (orch, breaker)
    }

    fn all_keys() -> Credentials {
        Credentials::new()
            .with_key(OPENAI, KEY)
            .with_key(ANTHROPIC, KEY)
            .with_key(GEMINI, KEY)
    }

    #[test]
    fn test_candidate_order() {
        let catalog = ProviderCatalog::builtin();
        assert_eq!(
            candidate_order(None, &catalog),
            vec!["openai", "anthropic", "gemini"]
        );
        assert_eq!(
            candidate_order(Some("gemini"), &catalog),
            vec!["gemini", "openai", "anthropic"]
        );
        assert_eq!(
            candidate_order(Some("mistral"), &catalog),
            vec!["mistral", "openai", "anthropic", "gemini"]
        );
        assert_eq!(
            candidate_order(Some("  "), &catalog),
            vec!["openai", "anthropic", "gemini"]
        );
    }

    #[test]
    fn test_preferred_model_resolver() {
        let catalog = ProviderCatalog::builtin();
        let r = PreferredModelResolver::new(&catalog, Some(ANTHROPIC), Some("claude-3-opus-20240229"));
        assert_eq!(r.resolve(ANTHROPIC).as_deref(), Some("claude-3-opus-20240229"));
        assert_eq!(r.resolve(OPENAI).as_deref(), Some("gpt-4o-mini"));
        assert_eq!(r.resolve("unknown"), None);
    }

    #[tokio::test]
    async fn test_no_credentials_means_no_provider_configured() {
        let transport = Arc::new(StubTransport::default());
        let (orch, _) = orchestrator(transport.clone());
        let catalog = ProviderCatalog::builtin();
        let order = candidate_order(None, &catalog);
        let resolver = PreferredModelResolver::new(&catalog, None, None);

        let err = orch
            .call(&order, &resolver, "hi", 0.8, 256, &Credentials::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoProviderConfigured));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_fails_over_in_order_and_records_outcomes() {
        let transport = Arc::new(
            StubTransport::default()
                .reply(OPENAI, 429, r#"{"error":{"message":"rate limited"}}"#)
                .reply(ANTHROPIC, 200, r#"{"content":[]}"#)
                .reply(GEMINI, 200, GEMINI_OK),
        );
        let (orch, breaker) = orchestrator(transport.clone());
        let catalog = ProviderCatalog::builtin();
        let order = candidate_order(None, &catalog);
        let resolver = PreferredModelResolver::new(&catalog, None, None);

        let result = orch
            .call(&order, &resolver, "hi", 0.8, 256, &all_keys())
            .await
            .unwrap();
        assert_eq!(result.raw_text, "from gemini");
        assert_eq!(result.provider_used, GEMINI);
        assert_eq!(result.model_used, "gemini-1.5-flash");
        assert_eq!(transport.sent(), vec![OPENAI, ANTHROPIC, GEMINI]);
        assert_eq!(breaker.snapshot(OPENAI).consecutive_failures, 1);
        assert_eq!(breaker.snapshot(ANTHROPIC).consecutive_failures, 1);
        assert_eq!(breaker.snapshot(GEMINI).consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let transport = Arc::new(
            StubTransport::default()
                .reply(OPENAI, 500, "{}")
                .reply(ANTHROPIC, 401, r#"{"error":{"message":"invalid x-api-key"}}"#),
        );
        let (orch, _) = orchestrator(transport.clone());
        let catalog = ProviderCatalog::builtin();
        let creds = Credentials::new().with_key(OPENAI, KEY).with_key(ANTHROPIC, KEY);
        let resolver = PreferredModelResolver::new(&catalog, None, None);

        let err = orch
            .call(&candidate_order(None, &catalog), &resolver, "hi", 0.3, 64, &creds)
            .await
            .unwrap_err();
        match err {
            Error::ProviderHttp {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, ANTHROPIC);
                assert_eq!(status, 401);
                assert_eq!(message, "invalid x-api-key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_open_circuit_is_skipped_without_sending() {
        let transport = Arc::new(StubTransport::default().reply(ANTHROPIC, 200, ANTHROPIC_OK));
        let (orch, breaker) = orchestrator(transport.clone());
        for _ in 0..3 {
            breaker.record_failure(OPENAI);
        }
        let catalog = ProviderCatalog::builtin();
        let resolver = PreferredModelResolver::new(&catalog, Some(OPENAI), None);

        let result = orch
            .call(
                &candidate_order(Some(OPENAI), &catalog),
                &resolver,
                "hi",
                0.8,
                64,
                &all_keys(),
            )
            .await
            .unwrap();
        assert_eq!(result.provider_used, ANTHROPIC);
        assert_eq!(transport.sent(), vec![ANTHROPIC]);
        // A skipped open circuit is not a new failure.
        assert_eq!(breaker.snapshot(OPENAI).consecutive_failures, 3);
    }

    #[tokio::test]
    async fn test_only_open_circuits_surface_circuit_open() {
        let transport = Arc::new(StubTransport::default());
        let (orch, breaker) = orchestrator(transport.clone());
        for _ in 0..3 {
            breaker.record_failure(OPENAI);
        }
        let catalog = ProviderCatalog::builtin();
        let creds = Credentials::new().with_key(OPENAI, KEY);
        let resolver = PreferredModelResolver::new(&catalog, None, None);

        let err = orch
            .call(&candidate_order(None, &catalog), &resolver, "hi", 0.8, 64, &creds)
            .await
            .unwrap_err();
        assert_eq!(err.retry_in_secs(), Some(30));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_parse_failure_counts_as_provider_failure() {
        let transport = Arc::new(
            StubTransport::default()
                .reply(OPENAI, 200, OPENAI_OK)
                .reply(ANTHROPIC, 200, ANTHROPIC_OK),
        );
        let (orch, breaker) = orchestrator(transport.clone());
        let catalog = ProviderCatalog::builtin();
        let resolver = PreferredModelResolver::new(&catalog, None, None);

        let out = orch
            .call_with(
                &candidate_order(None, &catalog),
                &resolver,
                "hi",
                0.3,
                64,
                &all_keys(),
                |text| {
                    if text.contains("anthropic") {
                        Ok(text.len())
                    } else {
                        Err(Error::malformed("not the JSON we asked for"))
                    }
                },
            )
            .await
            .unwrap();
        assert_eq!(out.provider_used, ANTHROPIC);
        assert_eq!(out.value, "from anthropic".len());
        assert_eq!(breaker.snapshot(OPENAI).consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_closure_resolver_can_skip_providers() {
        let transport = Arc::new(StubTransport::default().reply(GEMINI, 200, GEMINI_OK));
        let (orch, _) = orchestrator(transport.clone());
        let catalog = ProviderCatalog::builtin();
        let only_gemini = |p: &str| (p == GEMINI).then(|| "gemini-1.5-pro".to_string());

        let result = orch
            .call(&candidate_order(None, &catalog), &only_gemini, "hi", 0.8, 64, &all_keys())
            .await
            .unwrap();
        assert_eq!(result.model_used, "gemini-1.5-pro");
        assert_eq!(transport.sent(), vec![GEMINI]);
    }
}
