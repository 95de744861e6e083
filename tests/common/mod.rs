//! Shared fixtures: a scripted in-memory transport and client builders.

#![allow(dead_code)]

use async_trait::async_trait;
use quill_ai::clock::ManualClock;
use quill_ai::drivers::DriverRequest;
use quill_ai::transport::{Transport, TransportResponse};
use quill_ai::{Settings, StoryClient};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const TEST_KEY: &str = "sk-test-0123456789abcdef";

/// Replies queued per provider id; every request is recorded. A provider with an empty
/// queue answers HTTP 503.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<TransportResponse>>>,
    requests: Mutex<Vec<DriverRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, provider: &str, status: u16, body: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .entry(provider.to_string())
            .or_default()
            .push_back(TransportResponse::new(status, body));
    }

    /// Queue a successful reply carrying `text` in the provider's wire format.
    pub fn ok(&self, provider: &str, text: &str) {
        self.push(provider, 200, success_body(provider, text));
    }

    pub fn fail(&self, provider: &str, status: u16) {
        self.push(
            provider,
            status,
            json!({"error": {"message": format!("scripted {} failure", status)}}).to_string(),
        );
    }

    pub fn requests(&self) -> Vec<DriverRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn providers_called(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.provider.clone())
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &DriverRequest) -> quill_ai::Result<TransportResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&request.provider)
            .and_then(|q| q.pop_front());
        Ok(reply.unwrap_or_else(|| {
            TransportResponse::new(503, r#"{"error":{"message":"nothing scripted"}}"#)
        }))
    }
}

pub fn success_body(provider: &str, text: &str) -> String {
    let body = match provider {
        "anthropic" => json!({"content": [{"type": "text", "text": text}]}),
        "gemini" => json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}),
        _ => json!({"choices": [{"message": {"role": "assistant", "content": text}}]}),
    };
    body.to_string()
}

/// The user prompt inside a recorded request, whatever the wire format.
pub fn prompt_of(request: &DriverRequest) -> String {
    let body: &Value = &request.body;
    body.pointer("/messages/0/content")
        .or_else(|| body.pointer("/contents/0/parts/0/text"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

pub fn all_keys() -> Settings {
    Settings::new()
        .with_api_key("openai", TEST_KEY)
        .with_api_key("anthropic", TEST_KEY)
        .with_api_key("gemini", TEST_KEY)
}

pub fn client(
    settings: Settings,
    transport: Arc<ScriptedTransport>,
    clock: Arc<ManualClock>,
) -> StoryClient {
    StoryClient::builder()
        .settings(settings)
        .transport(transport)
        .clock(clock)
        .build()
        .expect("client builds")
}
