//! Canonical request/result shapes shared by every provider.

use serde::{Deserialize, Serialize};

/// Sampling presets offered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperaturePreset {
    /// Generative work: ideas, voice samples, prose.
    Creative,
    /// Detection and analysis: consistency, gaps, pacing.
    Analytical,
}

impl TemperaturePreset {
    pub fn temperature(self) -> f64 {
        match self {
            TemperaturePreset::Creative => 0.8,
            TemperaturePreset::Analytical => 0.3,
        }
    }
}

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Provider-neutral request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    pub prompt_text: String,
    pub preferred_provider: Option<String>,
    pub preferred_model: Option<String>,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl CanonicalRequest {
    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            preferred_provider: None,
            preferred_model: None,
            temperature: TemperaturePreset::Creative.temperature(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_preset(mut self, preset: TemperaturePreset) -> Self {
        self.temperature = preset.temperature();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.preferred_provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }
}

/// Raw provider text plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub raw_text: String,
    pub provider_used: String,
    pub model_used: String,
    #[serde(default)]
    pub served_from_cache: bool,
}
