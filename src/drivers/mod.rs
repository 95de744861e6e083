//! Provider 驱动抽象层：通过 trait 实现多厂商 API 适配的动态分发
//!
//! Provider driver abstraction layer. Each vendor's wire format lives in exactly one
//! [`ProviderDriver`] implementation; the [`DriverRegistry`] maps provider ids to drivers so the
//! failover loop never branches on provider names.
//!
//! Drivers are pure: they build request descriptions and extract text from response bodies.
//! The network round-trip belongs to [`crate::transport`].

pub mod anthropic;
pub mod gemini;
pub mod openai;

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{ANTHROPIC, GEMINI, OPENAI};
use crate::error::Error;

pub use anthropic::AnthropicDriver;
pub use gemini::GeminiDriver;
pub use openai::OpenAiDriver;

/// Unified HTTP request representation for provider communication.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverRequest {
    /// Provider the request is addressed to.
    pub provider: String,
    /// Fully resolved target URL, including any query-string credentials.
    pub url: String,
    /// Request headers. `content-type` is owned by the transport, which always sends JSON.
    pub headers: HashMap<String, String>,
    /// Serialized JSON request body.
    pub body: Value,
}

/// Core trait for provider-specific API adaptation.
///
/// The trait is object-safe and supports dynamic dispatch via `Arc<dyn ProviderDriver>`.
/// Temperature and max-token values are written to the body unchanged wherever the provider's
/// wire format carries them.
pub trait ProviderDriver: Send + Sync + std::fmt::Debug {
    /// Unique provider identifier (matches the catalog id).
    fn provider_id(&self) -> &str;

    /// Build a provider-specific HTTP request for a single user prompt.
    fn build_request(
        &self,
        model: &str,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        api_key: &str,
    ) -> Result<DriverRequest, Error>;

    /// Extract generated text from a response, or surface the provider's error envelope.
    fn extract_text(&self, status: u16, body: &str) -> Result<String, Error>;

    /// Copy of this driver aimed at another base URL, or `None` when the driver has a fixed
    /// endpoint.
    fn rebase(&self, _base_url: &str) -> Option<Arc<dyn ProviderDriver>> {
        None
    }
}

/// Pull `error.message` (or a bare string `error`) out of a provider error envelope.
pub(crate) fn provider_error_message(body: &Value) -> Option<String> {
    match body.get("error") {
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from),
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Shared extraction flow: status gate, JSON decode, text lookup at `pointer`.
pub(crate) fn extract_at(
    provider: &str,
    status: u16,
    body: &str,
    pointer: &str,
) -> Result<String, Error> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let envelope = parsed.as_ref().and_then(provider_error_message);

    if !(200..300).contains(&status) {
        return Err(Error::ProviderHttp {
            provider: provider.to_string(),
            status,
            message: envelope.unwrap_or_else(|| format!("request failed with HTTP {}", status)),
        });
    }

    parsed
        .as_ref()
        .and_then(|v| v.pointer(pointer))
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| Error::ProviderHttp {
            provider: provider.to_string(),
            status,
            message: envelope.unwrap_or_else(|| "response did not contain generated text".into()),
        })
}

/// Lookup table of provider drivers.
#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn ProviderDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the OpenAI, Anthropic and Gemini drivers at their public endpoints.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OpenAiDriver::new(OPENAI)));
        registry.register(Arc::new(AnthropicDriver::new(ANTHROPIC)));
        registry.register(Arc::new(GeminiDriver::new(GEMINI)));
        registry
    }

    /// Register (or replace) the driver for its provider id.
    pub fn register(&mut self, driver: Arc<dyn ProviderDriver>) {
        self.drivers.insert(driver.provider_id().to_string(), driver);
    }

    pub fn get(&self, provider: &str) -> Option<Arc<dyn ProviderDriver>> {
        self.drivers.get(provider).cloned()
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.drivers.contains_key(provider)
    }

    /// Re-point the registered driver for `provider` at another base URL (mock servers,
    /// proxies).
    pub fn override_base_url(&mut self, provider: &str, base_url: &str) -> Result<(), Error> {
        let rebased = self
            .drivers
            .get(provider)
            .and_then(|driver| driver.rebase(base_url));
        match rebased {
            Some(driver) => {
                self.register(driver);
                Ok(())
            }
            None => Err(Error::configuration_with_context(
                format!("provider '{}' has no driver that accepts a base URL", provider),
                crate::ErrorContext::new()
                    .with_field_path("base_url_overrides")
                    .with_source("driver_registry"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_defaults() {
        let registry = DriverRegistry::with_defaults();
        assert!(registry.contains("openai"));
        assert!(registry.contains("anthropic"));
        assert!(registry.contains("gemini"));
        assert!(registry.get("mistral").is_none());
    }

    #[test]
    fn test_override_base_url() {
        let mut registry = DriverRegistry::with_defaults();
        registry
            .override_base_url("openai", "http://127.0.0.1:9999")
            .unwrap();
        let req = registry
            .get("openai")
            .unwrap()
            .build_request("gpt-4o", "hi", 0.3, 100, "sk-test-key-123")
            .unwrap();
        assert_eq!(req.url, "http://127.0.0.1:9999/v1/chat/completions");
        assert!(registry.override_base_url("mistral", "http://x").is_err());
    }

    #[derive(Debug)]
    struct FixedEndpointDriver;

    impl ProviderDriver for FixedEndpointDriver {
        fn provider_id(&self) -> &str {
            "local"
        }

        fn build_request(
            &self,
            _model: &str,
            prompt: &str,
            _temperature: f64,
            _max_tokens: u32,
            _api_key: &str,
        ) -> Result<DriverRequest, Error> {
            Ok(DriverRequest {
                provider: "local".into(),
                url: "http://localhost:8080/generate".into(),
                headers: HashMap::new(),
                body: serde_json::json!({ "prompt": prompt }),
            })
        }

        fn extract_text(&self, status: u16, body: &str) -> Result<String, Error> {
            extract_at("local", status, body, "/text")
        }
    }

    #[test]
    fn test_override_follows_registered_driver() {
        let mut registry = DriverRegistry::with_defaults();
        registry.register(Arc::new(AnthropicDriver::new("claude-proxy")));
        registry
            .override_base_url("claude-proxy", "http://10.0.0.5:7000/")
            .unwrap();
        let req = registry
            .get("claude-proxy")
            .unwrap()
            .build_request("claude-3-5-haiku", "hi", 0.3, 100, "sk-ant-123456")
            .unwrap();
        assert_eq!(req.provider, "claude-proxy");
        assert_eq!(req.url, "http://10.0.0.5:7000/v1/messages");
    }

    #[test]
    fn test_override_rejected_for_fixed_endpoint_driver() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(FixedEndpointDriver));
        let err = registry
            .override_base_url("local", "http://elsewhere")
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(registry.contains("local"));
    }

    #[test]
    fn test_builtin_drivers_leave_content_type_to_transport() {
        let registry = DriverRegistry::with_defaults();
        for id in ["openai", "anthropic", "gemini"] {
            let req = registry
                .get(id)
                .unwrap()
                .build_request("m", "hi", 0.8, 10, "key-0123456789")
                .unwrap();
            assert!(
                !req.headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")),
                "{id} sets content-type"
            );
        }
    }

    #[test]
    fn test_error_envelope_shapes() {
        let nested = serde_json::json!({"error": {"message": "quota exceeded"}});
        assert_eq!(provider_error_message(&nested).as_deref(), Some("quota exceeded"));
        let flat = serde_json::json!({"error": "bad key"});
        assert_eq!(provider_error_message(&flat).as_deref(), Some("bad key"));
        assert_eq!(provider_error_message(&serde_json::json!({})), None);
    }

    #[test]
    fn test_extract_generic_message_for_non_json_error() {
        let err = extract_at("openai", 502, "<html>bad gateway</html>", "/x").unwrap_err();
        match err {
            Error::ProviderHttp { status, message, .. } => {
                assert_eq!(status, 502);
                assert_eq!(message, "request failed with HTTP 502");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
