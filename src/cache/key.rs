//! Cache key generation.
//!
//! Keys are derived from a feature name plus a few semantically relevant request fields, each
//! whitespace-normalised and truncated, then hashed. Raw request text (and anything secret in
//! it) never becomes part of a key, and key size stays constant.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default number of characters kept per field before hashing.
pub const DEFAULT_FIELD_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub feature: String,
    pub hash: String,
}

impl CacheKey {
    pub fn as_string(&self) -> String {
        format!("{}:{}", self.feature, self.hash)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.feature, self.hash)
    }
}

/// Builder for feature cache keys.
#[derive(Debug, Clone)]
pub struct CacheKeyGenerator {
    feature: String,
    parts: Vec<(String, String)>,
}

impl CacheKeyGenerator {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            parts: Vec::new(),
        }
    }

    /// Add a field truncated to [`DEFAULT_FIELD_CHARS`].
    pub fn field(self, name: &str, value: &str) -> Self {
        self.field_truncated(name, value, DEFAULT_FIELD_CHARS)
    }

    pub fn field_truncated(mut self, name: &str, value: &str, max_chars: usize) -> Self {
        let normalized = normalize(value);
        let truncated: String = normalized.chars().take(max_chars).collect();
        self.parts.push((name.to_string(), truncated));
        self
    }

    pub fn build(self) -> CacheKey {
        let mut hasher = Sha256::new();
        hasher.update(self.feature.as_bytes());
        for (name, value) in &self.parts {
            hasher.update([0u8]);
            hasher.update(name.as_bytes());
            hasher.update([0x1fu8]);
            hasher.update(value.as_bytes());
        }
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        CacheKey {
            feature: self.feature,
            hash,
        }
    }
}

/// Lowercase and collapse runs of whitespace so cosmetic edits hit the same entry.
fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
