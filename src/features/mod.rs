//! 功能请求：每个读取型写作功能一个请求类型，负责缓存键、提示词与输出结构。
//!
//! # Feature Requests
//!
//! Read-style features (ideas, consistency checks, ripple effects, gaps, voice samples,
//! blueprints, pacing and theme analysis) share one path through the client:
//! cache → failover → structured parser. Each request type only decides three things:
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`FeatureRequest::cache_key`] | Feature name plus a few truncated fields |
//! | [`FeatureRequest::prompt`] | Instructions plus the JSON shape the parser expects |
//! | [`FeatureRequest::schema`] | Enum fields and defaults to coerce against |
//!
//! Generative features use [`TemperaturePreset::Creative`], detection and analysis features
//! use [`TemperaturePreset::Analytical`].

mod analysis;
mod generation;

pub use analysis::{ConsistencyRequest, GapRequest, PacingRequest, RippleRequest, ThemeRequest};
pub use generation::{BlueprintRequest, IdeaRequest, VoiceSampleRequest};

use serde::{Deserialize, Serialize};

use crate::cache::CacheKey;
use crate::client::types::{TemperaturePreset, DEFAULT_MAX_OUTPUT_TOKENS};
use crate::structured::{FieldKind, ItemSchema, StructuredItem};

/// A read-style feature call.
pub trait FeatureRequest: Send + Sync {
    /// Stable feature name, also the cache key prefix.
    fn feature(&self) -> &'static str;

    fn cache_key(&self) -> CacheKey;

    fn prompt(&self) -> String;

    fn schema(&self) -> &'static ItemSchema;

    fn preset(&self) -> TemperaturePreset;

    fn max_tokens(&self) -> u32 {
        DEFAULT_MAX_OUTPUT_TOKENS
    }
}

/// Parsed items plus the provider/model that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureOutput {
    pub items: Vec<StructuredItem>,
    pub provider_used: String,
    pub model_used: String,
}

/// Render the JSON shape a schema expects, e.g.
/// `{"issues": [{"severity": "error|warning|info", "description": "string"}]}`.
pub(crate) fn response_shape(schema: &ItemSchema) -> String {
    let fields: Vec<String> = schema
        .fields
        .iter()
        .map(|f| match f.kind {
            FieldKind::Text => format!("\"{}\": \"string\"", f.name),
            FieldKind::Enum { allowed, .. } => {
                format!("\"{}\": \"{}\"", f.name, allowed.join("|"))
            }
        })
        .collect();
    let item = format!("{{{}}}", fields.join(", "));
    match schema.collection_key {
        Some(key) => format!("{{\"{}\": [{}]}}", key, item),
        None => item,
    }
}

/// Common prompt tail: the cap, the shape, and the "JSON only" instruction.
pub(crate) fn json_instructions(schema: &ItemSchema) -> String {
    let cap = schema
        .advisory_cap
        .map(|n| format!("Return at most {} items. ", n))
        .unwrap_or_default();
    format!(
        "{}Respond with JSON only, no commentary, in exactly this shape:\n{}",
        cap,
        response_shape(schema)
    )
}

pub(crate) fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", i.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
