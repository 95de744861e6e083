//! Generative features: ideas, voice samples, chapter blueprints.

use serde::{Deserialize, Serialize};

use super::{bullet_list, json_instructions, FeatureRequest};
use crate::cache::{CacheKey, CacheKeyGenerator};
use crate::client::types::TemperaturePreset;
use crate::structured::schema::{BLUEPRINT_SECTION, IDEA, VOICE_SAMPLE};
use crate::structured::ItemSchema;

/// Story ideas seeded by one entity (a character, place, object...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaRequest {
    pub entity_name: String,
    pub entity_type: String,
    pub description: String,
    #[serde(default)]
    pub story_context: Option<String>,
}

impl IdeaRequest {
    pub fn new(
        entity_name: impl Into<String>,
        entity_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            entity_type: entity_type.into(),
            description: description.into(),
            story_context: None,
        }
    }

    pub fn with_story_context(mut self, context: impl Into<String>) -> Self {
        self.story_context = Some(context.into());
        self
    }
}

impl FeatureRequest for IdeaRequest {
    fn feature(&self) -> &'static str {
        "ideas"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKeyGenerator::new(self.feature())
            .field("entity_name", &self.entity_name)
            .field("entity_type", &self.entity_type)
            .field("description", &self.description)
            .field("story_context", self.story_context.as_deref().unwrap_or(""))
            .build()
    }

    fn prompt(&self) -> String {
        let context = self
            .story_context
            .as_deref()
            .map(|c| format!("\nStory so far: {}\n", c.trim()))
            .unwrap_or_default();
        format!(
            "You are a creative writing partner. Suggest fresh story ideas involving the {} \
             \"{}\".\nDescription: {}\n{}\nEach idea needs a short title, a one-paragraph \
             description and a category.\n{}",
            self.entity_type.trim(),
            self.entity_name.trim(),
            self.description.trim(),
            context,
            json_instructions(self.schema())
        )
    }

    fn schema(&self) -> &'static ItemSchema {
        &IDEA
    }

    fn preset(&self) -> TemperaturePreset {
        TemperaturePreset::Creative
    }
}

/// Sample dialogue lines in one character's voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSampleRequest {
    pub character_name: String,
    pub personality: String,
    #[serde(default)]
    pub situation: Option<String>,
}

impl VoiceSampleRequest {
    pub fn new(character_name: impl Into<String>, personality: impl Into<String>) -> Self {
        Self {
            character_name: character_name.into(),
            personality: personality.into(),
            situation: None,
        }
    }

    pub fn in_situation(mut self, situation: impl Into<String>) -> Self {
        self.situation = Some(situation.into());
        self
    }
}

impl FeatureRequest for VoiceSampleRequest {
    fn feature(&self) -> &'static str {
        "voice_samples"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKeyGenerator::new(self.feature())
            .field("character_name", &self.character_name)
            .field("personality", &self.personality)
            .field("situation", self.situation.as_deref().unwrap_or(""))
            .build()
    }

    fn prompt(&self) -> String {
        let situation = self
            .situation
            .as_deref()
            .map(|s| format!("Situation: {}\n", s.trim()))
            .unwrap_or_default();
        format!(
            "Write lines of dialogue that capture how {} speaks.\nPersonality: {}\n{}\
             Vary the emotion across lines and give the context for each.\n{}",
            self.character_name.trim(),
            self.personality.trim(),
            situation,
            json_instructions(self.schema())
        )
    }

    fn schema(&self) -> &'static ItemSchema {
        &VOICE_SAMPLE
    }

    fn preset(&self) -> TemperaturePreset {
        TemperaturePreset::Creative
    }
}

/// Section-by-section outline for assembling a chapter from its scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintRequest {
    pub chapter_title: String,
    pub premise: String,
    #[serde(default)]
    pub scene_summaries: Vec<String>,
}

impl BlueprintRequest {
    pub fn new(chapter_title: impl Into<String>, premise: impl Into<String>) -> Self {
        Self {
            chapter_title: chapter_title.into(),
            premise: premise.into(),
            scene_summaries: Vec::new(),
        }
    }

    pub fn with_scenes(mut self, scenes: Vec<String>) -> Self {
        self.scene_summaries = scenes;
        self
    }
}

impl FeatureRequest for BlueprintRequest {
    fn feature(&self) -> &'static str {
        "blueprint"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKeyGenerator::new(self.feature())
            .field("chapter_title", &self.chapter_title)
            .field("premise", &self.premise)
            .field("scenes", &self.scene_summaries.join(" | "))
            .build()
    }

    fn prompt(&self) -> String {
        format!(
            "Draft a blueprint for the chapter \"{}\".\nPremise: {}\nScenes available:\n{}\n\
             Break the chapter into sections with a title, the purpose each serves and its \
             pacing.\n{}",
            self.chapter_title.trim(),
            self.premise.trim(),
            bullet_list(&self.scene_summaries),
            json_instructions(self.schema())
        )
    }

    fn schema(&self) -> &'static ItemSchema {
        &BLUEPRINT_SECTION
    }

    fn preset(&self) -> TemperaturePreset {
        TemperaturePreset::Creative
    }

    fn max_tokens(&self) -> u32 {
        3000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idea_key_ignores_formatting_and_long_tails() {
        let base = "A smuggler with a debt to the wrong people and a ship that will not stay fixed";
        let a = IdeaRequest::new("Mara Vell", "character", base);
        let b = IdeaRequest::new(" mara  vell", "Character", format!("{} anymore", base));
        assert_eq!(a.cache_key(), b.cache_key());

        let c = IdeaRequest::new("Mara Vell", "character", "A pilot");
        assert_ne!(a.cache_key(), c.cache_key());
        assert_eq!(a.cache_key().feature, "ideas");
    }

    #[test]
    fn test_idea_prompt_carries_shape_and_cap() {
        let prompt = IdeaRequest::new("Mara", "character", "smuggler")
            .with_story_context("The heist went wrong")
            .prompt();
        assert!(prompt.contains("\"Mara\""));
        assert!(prompt.contains("The heist went wrong"));
        assert!(prompt.contains("at most 5 items"));
        assert!(prompt.contains("plot|character|setting|conflict|theme"));
    }

    #[test]
    fn test_presets() {
        assert_eq!(
            VoiceSampleRequest::new("Mara", "dry").preset(),
            TemperaturePreset::Creative
        );
        assert_eq!(BlueprintRequest::new("One", "start").max_tokens(), 3000);
    }

    #[test]
    fn test_blueprint_lists_scenes() {
        let prompt = BlueprintRequest::new("Chapter 3", "The chase")
            .with_scenes(vec!["Docks at night".into(), "Rooftop standoff".into()])
            .prompt();
        assert!(prompt.contains("- Docks at night\n- Rooftop standoff"));
        assert!(prompt.contains("\"sections\""));
    }
}
