use super::{Transport, TransportError, TransportResponse};
use crate::config::HttpSettings;
use crate::drivers::DriverRequest;
use crate::Result;
use async_trait::async_trait;
use reqwest::Proxy;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// reqwest-backed transport shared by every provider.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(settings.pool_idle_timeout_secs)));

        if let Some(proxy_url) = settings.proxy_url.as_deref() {
            if let Ok(proxy) = Proxy::all(proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &DriverRequest) -> Result<TransportResponse> {
        let request_id = Uuid::new_v4().to_string();
        let mut req = self.client.post(&request.url).json(&request.body);
        for (k, v) in &request.headers {
            // `.json()` already set it; a second copy would be sent as a duplicate header.
            if k.eq_ignore_ascii_case("content-type") {
                continue;
            }
            req = req.header(k.as_str(), v.as_str());
        }
        // Our own correlation id. Providers may ignore it.
        req = req.header("x-quill-request-id", request_id.as_str());

        let resp = req
            .send()
            .await
            .map_err(|e| crate::Error::Transport(TransportError::Http(e)))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| crate::Error::Transport(TransportError::Http(e)))?;

        debug!(
            provider = request.provider.as_str(),
            request_id = request_id.as_str(),
            http_status = status,
            body_len = body.len(),
            "provider round-trip complete"
        );
        Ok(TransportResponse { status, body })
    }
}
