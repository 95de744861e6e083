//! OpenAI Chat Completions driver.
//!
//! - Body: `{model, messages: [{role: "user", content}], temperature, max_tokens}`.
//! - Auth: `Authorization: Bearer <key>`.
//! - Response text: `choices[0].message.content`.

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::{extract_at, DriverRequest, ProviderDriver};
use crate::error::Error;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const CHAT_PATH: &str = "/v1/chat/completions";

#[derive(Debug)]
pub struct OpenAiDriver {
    provider_id: String,
    base_url: String,
}

impl OpenAiDriver {
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

impl ProviderDriver for OpenAiDriver {
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
        let body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let mut headers = HashMap::new();
        headers.insert("authorization".into(), format!("Bearer {}", api_key));

        Ok(DriverRequest {
            provider: self.provider_id.clone(),
            url: format!("{}{}", self.base_url, CHAT_PATH),
            headers,
            body,
        })
    }

    fn extract_text(&self, status: u16, body: &str) -> Result<String, Error> {
        extract_at(&self.provider_id, status, body, "/choices/0/message/content")
    }
}
