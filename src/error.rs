use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "settings.api_keys", "options.emotional_intensity")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "settings_loader", "co_write_pipeline")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the orchestration core.
///
/// Per-provider failures (`CircuitOpen`, `ProviderHttp`, `MalformedResponse`, `Transport`)
/// are absorbed by the failover loop; callers only ever see the last one after every
/// candidate has been tried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No AI provider configured: add an API key for at least one provider in settings")]
    NoProviderConfigured,

    #[error("Circuit open for {provider}, retry in {retry_in_secs} seconds")]
    CircuitOpen { provider: String, retry_in_secs: u64 },

    #[error("{provider} API error (HTTP {status}): {message}")]
    ProviderHttp {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Malformed model response: {message}")]
    MalformedResponse { message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedResponse {
            message: msg.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// True for errors scoped to a single provider attempt, which failover recovers from.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Error::CircuitOpen { .. }
                | Error::ProviderHttp { .. }
                | Error::MalformedResponse { .. }
                | Error::Transport(_)
        )
    }

    /// Remaining cooldown when the error is a fail-fast circuit rejection.
    pub fn retry_in_secs(&self) -> Option<u64> {
        match self {
            Error::CircuitOpen { retry_in_secs, .. } => Some(*retry_in_secs),
            _ => None,
        }
    }
}
