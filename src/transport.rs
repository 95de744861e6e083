//! Network collaborator: sends a [`DriverRequest`] and hands back status plus raw body.
//!
//! Everything provider-specific stays in the drivers; a transport only moves bytes. The
//! [`Transport`] trait is the seam tests use to script provider behavior without a network.

pub mod http;

pub use http::HttpTransport;

use crate::drivers::DriverRequest;
use crate::Result;
use async_trait::async_trait;

/// Raw HTTP outcome of one provider round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round-trip. Non-success statuses are returned, not raised; only
    /// connection-level failures are errors.
    async fn send(&self, request: &DriverRequest) -> Result<TransportResponse>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
