//! Anthropic Messages API 驱动：实现 Anthropic 特有的请求/响应格式转换
//!
//! Anthropic Messages API driver. Handles the key differences from OpenAI:
//! - Body is `{model, max_tokens, messages}`; `max_tokens` is required and no temperature is sent.
//! - Auth uses an `x-api-key` header plus an `anthropic-version` header.
//! - Response uses `content[0].text` instead of `choices[0].message.content`.

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::{extract_at, DriverRequest, ProviderDriver};
use crate::error::Error;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API driver.
#[derive(Debug)]
pub struct AnthropicDriver {
    provider_id: String,
    base_url: String,
}

impl AnthropicDriver {
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

impl ProviderDriver for AnthropicDriver {
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
        _temperature: f64,
        max_tokens: u32,
        api_key: &str,
    ) -> Result<DriverRequest, Error> {
        let body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut headers = HashMap::new();
        headers.insert("x-api-key".into(), api_key.to_string());
        headers.insert("anthropic-version".into(), API_VERSION.into());

        Ok(DriverRequest {
            provider: self.provider_id.clone(),
            url: format!("{}{}", self.base_url, MESSAGES_PATH),
            headers,
            body,
        })
    }

    fn extract_text(&self, status: u16, body: &str) -> Result<String, Error> {
        // Anthropic response: { content: [{type: "text", text: "..."}], stop_reason, usage }
        extract_at(&self.provider_id, status, body, "/content/0/text")
    }
}
