//! Detection and analysis features. All of them run with the analytical preset.

use serde::{Deserialize, Serialize};

use super::{bullet_list, json_instructions, FeatureRequest};
use crate::cache::{CacheKey, CacheKeyGenerator};
use crate::client::types::TemperaturePreset;
use crate::structured::schema::{GAP, ISSUE, PACING_SEGMENT, RIPPLE_EFFECT, THEME};
use crate::structured::ItemSchema;

/// Contradictions between a passage and what the story has established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyRequest {
    pub text: String,
    #[serde(default)]
    pub known_facts: Vec<String>,
}

impl ConsistencyRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            known_facts: Vec::new(),
        }
    }

    pub fn with_facts(mut self, facts: Vec<String>) -> Self {
        self.known_facts = facts;
        self
    }
}

impl FeatureRequest for ConsistencyRequest {
    fn feature(&self) -> &'static str {
        "consistency"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKeyGenerator::new(self.feature())
            .field("text", &self.text)
            .field("text_chars", &self.text.chars().count().to_string())
            .field("facts", &self.known_facts.join(" | "))
            .build()
    }

    fn prompt(&self) -> String {
        format!(
            "Check this passage for consistency problems: character details, timeline, \
             locations, logic gaps and worldbuilding rules.\nEstablished facts:\n{}\n\n\
             Passage:\n{}\n\nFor each issue give its severity, category, a description and a \
             suggested fix.\n{}",
            bullet_list(&self.known_facts),
            self.text.trim(),
            json_instructions(self.schema())
        )
    }

    fn schema(&self) -> &'static ItemSchema {
        &ISSUE
    }

    fn preset(&self) -> TemperaturePreset {
        TemperaturePreset::Analytical
    }
}

/// Downstream consequences of changing one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RippleRequest {
    pub entity_name: String,
    pub change_description: String,
    #[serde(default)]
    pub related_entities: Vec<String>,
}

impl RippleRequest {
    pub fn new(entity_name: impl Into<String>, change_description: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            change_description: change_description.into(),
            related_entities: Vec::new(),
        }
    }

    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related_entities = related;
        self
    }
}

impl FeatureRequest for RippleRequest {
    fn feature(&self) -> &'static str {
        "ripple_effects"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKeyGenerator::new(self.feature())
            .field("entity_name", &self.entity_name)
            .field("change", &self.change_description)
            .field("related", &self.related_entities.join(" | "))
            .build()
    }

    fn prompt(&self) -> String {
        format!(
            "The writer is changing \"{}\": {}\nRelated story elements:\n{}\n\nList the \
             entities this change affects, how strongly, what breaks and how to fix it.\n{}",
            self.entity_name.trim(),
            self.change_description.trim(),
            bullet_list(&self.related_entities),
            json_instructions(self.schema())
        )
    }

    fn schema(&self) -> &'static ItemSchema {
        &RIPPLE_EFFECT
    }

    fn preset(&self) -> TemperaturePreset {
        TemperaturePreset::Analytical
    }
}

/// Underdeveloped threads in a story summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapRequest {
    pub summary: String,
    #[serde(default)]
    pub entity_names: Vec<String>,
}

impl GapRequest {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            entity_names: Vec::new(),
        }
    }

    pub fn with_entities(mut self, names: Vec<String>) -> Self {
        self.entity_names = names;
        self
    }
}

impl FeatureRequest for GapRequest {
    fn feature(&self) -> &'static str {
        "gaps"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKeyGenerator::new(self.feature())
            .field("summary", &self.summary)
            .field("entities", &self.entity_names.join(" | "))
            .build()
    }

    fn prompt(&self) -> String {
        format!(
            "Find gaps in this story: missing motivations, dropped plot threads, thin \
             worldbuilding, timeline holes.\nSummary:\n{}\nKnown entities:\n{}\n\n{}",
            self.summary.trim(),
            bullet_list(&self.entity_names),
            json_instructions(self.schema())
        )
    }

    fn schema(&self) -> &'static ItemSchema {
        &GAP
    }

    fn preset(&self) -> TemperaturePreset {
        TemperaturePreset::Analytical
    }
}

/// Pace of each stretch of a passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingRequest {
    pub text: String,
}

impl PacingRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl FeatureRequest for PacingRequest {
    fn feature(&self) -> &'static str {
        "pacing"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKeyGenerator::new(self.feature())
            .field("text", &self.text)
            .field("text_chars", &self.text.chars().count().to_string())
            .build()
    }

    fn prompt(&self) -> String {
        format!(
            "Analyse the pacing of this passage. Split it into segments, quote a short \
             excerpt from each, rate its pace and add a note.\n\nPassage:\n{}\n\n{}",
            self.text.trim(),
            json_instructions(self.schema())
        )
    }

    fn schema(&self) -> &'static ItemSchema {
        &PACING_SEGMENT
    }

    fn preset(&self) -> TemperaturePreset {
        TemperaturePreset::Analytical
    }
}

/// Themes present in a passage and how strongly they come through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeRequest {
    pub text: String,
}

impl ThemeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl FeatureRequest for ThemeRequest {
    fn feature(&self) -> &'static str {
        "themes"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKeyGenerator::new(self.feature())
            .field("text", &self.text)
            .field("text_chars", &self.text.chars().count().to_string())
            .build()
    }

    fn prompt(&self) -> String {
        format!(
            "Identify the themes in this passage, how strongly each comes through and the \
             evidence for it.\n\nPassage:\n{}\n\n{}",
            self.text.trim(),
            json_instructions(self.schema())
        )
    }

    fn schema(&self) -> &'static ItemSchema {
        &THEME
    }

    fn preset(&self) -> TemperaturePreset {
        TemperaturePreset::Analytical
    }
}
