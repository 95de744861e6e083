//! Gemini Generate API 驱动：实现 Google Gemini 特有的请求/响应格式转换
//!
//! Google Gemini generateContent API driver. Key differences:
//! - Uses `contents` instead of `messages`, with `parts` instead of `content`.
//! - `generationConfig` wraps temperature and `maxOutputTokens`.
//! - Response: `candidates[0].content.parts[0].text`.
//! - API key is passed as `?key=` query parameter, not in headers.

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use super::{extract_at, DriverRequest, ProviderDriver};
use crate::error::Error;
use crate::ErrorContext;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini generateContent API driver.
#[derive(Debug)]
pub struct GeminiDriver {
    provider_id: String,
    base_url: String,
}

impl GeminiDriver {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl ProviderDriver for GeminiDriver {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn rebase(&self, base_url: &str) -> Option<Arc<dyn ProviderDriver>> {
        Some(Arc::new(Self::new(self.provider_id.clone()).with_base_url(base_url)))
    }

    fn build_request(
        &self,
        model: &str,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        api_key: &str,
    ) -> Result<DriverRequest, Error> {
        let raw = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model
        );
        let mut url = Url::parse(&raw).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid Gemini endpoint '{}': {}", raw, e),
                ErrorContext::new().with_source("gemini_driver"),
            )
        })?;
        url.query_pairs_mut().append_pair("key", api_key);

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_tokens,
            },
        });

        let headers = HashMap::new();

        Ok(DriverRequest {
            provider: self.provider_id.clone(),
            url: url.to_string(),
            headers,
            body,
        })
    }

    fn extract_text(&self, status: u16, body: &str) -> Result<String, Error> {
        extract_at(
            &self.provider_id,
            status,
            body,
            "/candidates/0/content/parts/0/text",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_build_request() {
        let driver = GeminiDriver::new("gemini");
        let req = driver
            .build_request("gemini-1.5-flash", "Hello", 0.8, 512, "AIza-test-key")
            .unwrap();
        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=AIza-test-key"
        );
        assert_eq!(
            req.body,
            json!({
                "contents": [{"parts": [{"text": "Hello"}]}],
                "generationConfig": {"temperature": 0.8, "maxOutputTokens": 512}
            })
        );
        assert!(!req.headers.contains_key("authorization"));
    }

    #[test]
    fn test_gemini_key_is_query_encoded() {
        let driver = GeminiDriver::new("gemini");
        let req = driver
            .build_request("gemini-1.5-pro", "x", 0.3, 10, "a&b=c")
            .unwrap();
        assert!(req.url.ends_with("?key=a%26b%3Dc"));
    }

    #[test]
    fn test_gemini_extract_text() {
        let driver = GeminiDriver::new("gemini");
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Once upon"}],"role":"model"}}]}"#;
        assert_eq!(driver.extract_text(200, body).unwrap(), "Once upon");
    }

    #[test]
    fn test_gemini_error_envelope() {
        let driver = GeminiDriver::new("gemini");
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        match driver.extract_text(400, body).unwrap_err() {
            Error::ProviderHttp { message, .. } => assert_eq!(message, "API key not valid."),
            other => panic!("unexpected {:?}", other),
        }
    }
}
