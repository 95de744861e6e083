//! 协同写作流水线：规划 → 拆解 → 扩写，严格顺序执行，每一步的提示词依赖上一步的结构化输出。
//!
//! # Co-Writing Pipeline
//!
//! Multi-step generation where each step's prompt depends on the previous step's validated
//! output, with narrative context carried forward.
//!
//! ```text
//! CoWriteRequest ─► Plan ─► ScenePlan ─► Decompose ─► [Beat; n] ─► Elaborate × n ─► prose
//!                                                         │              ▲
//!                                                         └─ rolling window of prior prose
//! ```
//!
//! | Stage | Calls | Output |
//! |-------|-------|--------|
//! | Plan | 1 | [`ScenePlan`] (pov, goal, conflict, resolution, setting, opening line) |
//! | Decompose | 1 | ordered [`Beat`]s, each with a [`BeatType`] |
//! | Elaborate | 1 per beat | prose segment, appended to [`PipelineContext`] |
//!
//! Every call goes through the client's failover path, so a single provider outage does not
//! stop the pipeline. Anything that still fails aborts the whole run: no partial prose is
//! returned and the error propagates unchanged.

mod co_write;
mod prompts;

pub use co_write::CoWritePipeline;

use serde::{Deserialize, Serialize};

use crate::structured::StructuredItem;
use crate::{Error, ErrorContext, Result};

/// Trailing prose (in characters) embedded in each elaboration prompt.
pub const DEFAULT_WINDOW_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointOfView {
    FirstPerson,
    SecondPerson,
    ThirdLimited,
    ThirdOmniscient,
}

impl PointOfView {
    pub fn describe(self) -> &'static str {
        match self {
            PointOfView::FirstPerson => "first person",
            PointOfView::SecondPerson => "second person",
            PointOfView::ThirdLimited => "third person limited",
            PointOfView::ThirdOmniscient => "third person omniscient",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tense {
    Past,
    Present,
}

impl Tense {
    pub fn describe(self) -> &'static str {
        match self {
            Tense::Past => "past tense",
            Tense::Present => "present tense",
        }
    }
}

/// Style knobs for a co-writing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoWriteOptions {
    pub tone: String,
    pub point_of_view: PointOfView,
    pub tense: Tense,
    /// Target length of the whole scene in words.
    pub target_words: u32,
    pub include_dialogue: bool,
    /// 1 (restrained) to 5 (intense). Out-of-range values are clamped.
    pub emotional_intensity: u8,
    /// Short summary of the chapter before this scene.
    pub previous_chapter: Option<String>,
    /// Short summary of the chapter after this scene.
    pub next_chapter: Option<String>,
}

impl Default for CoWriteOptions {
    fn default() -> Self {
        Self {
            tone: "neutral".to_string(),
            point_of_view: PointOfView::ThirdLimited,
            tense: Tense::Past,
            target_words: 800,
            include_dialogue: true,
            emotional_intensity: 3,
            previous_chapter: None,
            next_chapter: None,
        }
    }
}

impl CoWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn with_point_of_view(mut self, pov: PointOfView) -> Self {
        self.point_of_view = pov;
        self
    }

    pub fn with_tense(mut self, tense: Tense) -> Self {
        self.tense = tense;
        self
    }

    pub fn with_target_words(mut self, words: u32) -> Self {
        self.target_words = words;
        self
    }

    pub fn with_dialogue(mut self, include: bool) -> Self {
        self.include_dialogue = include;
        self
    }

    pub fn with_emotional_intensity(mut self, intensity: u8) -> Self {
        self.emotional_intensity = intensity.clamp(1, 5);
        self
    }

    pub fn with_previous_chapter(mut self, summary: impl Into<String>) -> Self {
        self.previous_chapter = Some(summary.into());
        self
    }

    pub fn with_next_chapter(mut self, summary: impl Into<String>) -> Self {
        self.next_chapter = Some(summary.into());
        self
    }

    /// Intensity clamped to 1..=5 (deserialised options may carry anything).
    pub fn intensity(&self) -> u8 {
        self.emotional_intensity.clamp(1, 5)
    }
}

/// Input to [`CoWritePipeline::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoWriteRequest {
    pub scene_description: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub options: CoWriteOptions,
    #[serde(default)]
    pub preferred_provider: Option<String>,
    #[serde(default)]
    pub preferred_model: Option<String>,
}

impl CoWriteRequest {
    pub fn new(scene_description: impl Into<String>) -> Self {
        Self {
            scene_description: scene_description.into(),
            characters: Vec::new(),
            options: CoWriteOptions::default(),
            preferred_provider: None,
            preferred_model: None,
        }
    }

    pub fn with_characters(mut self, characters: Vec<String>) -> Self {
        self.characters = characters;
        self
    }

    pub fn with_options(mut self, options: CoWriteOptions) -> Self {
        self.options = options;
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

    pub(crate) fn validate(&self) -> Result<()> {
        if self.scene_description.trim().is_empty() {
            return Err(Error::validation_with_context(
                "scene description must not be empty",
                ErrorContext::new()
                    .with_field_path("request.scene_description")
                    .with_source("co_write_pipeline"),
            ));
        }
        Ok(())
    }
}

/// Result of the Plan stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePlan {
    pub pov: String,
    pub goal: String,
    pub conflict: String,
    pub resolution: String,
    pub setting: String,
    pub opening_line: String,
}

impl ScenePlan {
    pub fn from_item(item: &StructuredItem) -> Self {
        Self {
            pov: item.str("pov").to_string(),
            goal: item.str("goal").to_string(),
            conflict: item.str("conflict").to_string(),
            resolution: item.str("resolution").to_string(),
            setting: item.str("setting").to_string(),
            opening_line: item.str("opening_line").to_string(),
        }
    }

    /// Compact rendering embedded in later prompts.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for (label, value) in [
            ("POV", &self.pov),
            ("Goal", &self.goal),
            ("Conflict", &self.conflict),
            ("Resolution", &self.resolution),
            ("Setting", &self.setting),
            ("Opening line", &self.opening_line),
        ] {
            if !value.trim().is_empty() {
                lines.push(format!("{}: {}", label, value.trim()));
            }
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatType {
    Action,
    Dialogue,
    Emotion,
    Description,
    Internal,
}

impl BeatType {
    pub fn as_str(self) -> &'static str {
        match self {
            BeatType::Action => "action",
            BeatType::Dialogue => "dialogue",
            BeatType::Emotion => "emotion",
            BeatType::Description => "description",
            BeatType::Internal => "internal",
        }
    }

    /// Unknown names map to `Action`, the schema default.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "dialogue" => BeatType::Dialogue,
            "emotion" => BeatType::Emotion,
            "description" => BeatType::Description,
            "internal" => BeatType::Internal,
            _ => BeatType::Action,
        }
    }
}

impl std::fmt::Display for BeatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of the Decompose stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beat {
    pub beat_type: BeatType,
    pub description: String,
}

impl Beat {
    pub fn from_item(item: &StructuredItem) -> Self {
        Self {
            beat_type: BeatType::parse(item.str("type")),
            description: item.str("description").to_string(),
        }
    }
}

/// Accumulated pipeline state. Step outputs are append-only; only the rolling window view is
/// truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineContext {
    plan_output: Option<String>,
    step_outputs: Vec<String>,
    window_chars: usize,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CHARS)
    }
}

impl PipelineContext {
    pub fn new(window_chars: usize) -> Self {
        Self {
            plan_output: None,
            step_outputs: Vec::new(),
            window_chars,
        }
    }

    pub fn set_plan_output(&mut self, plan: impl Into<String>) {
        self.plan_output = Some(plan.into());
    }

    pub fn plan_output(&self) -> Option<&str> {
        self.plan_output.as_deref()
    }

    pub fn push_step(&mut self, output: impl Into<String>) {
        self.step_outputs.push(output.into());
    }

    pub fn step_outputs(&self) -> &[String] {
        &self.step_outputs
    }

    /// All step outputs joined as paragraphs.
    pub fn full_text(&self) -> String {
        self.step_outputs.join("\n\n")
    }

    /// The last `window_chars` characters of the accumulated text. Always cut on a character
    /// boundary.
    pub fn rolling_window(&self) -> String {
        let full = self.full_text();
        let total = full.chars().count();
        if total <= self.window_chars {
            return full;
        }
        full.chars().skip(total - self.window_chars).collect()
    }
}

/// Everything a co-writing run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoWriteOutput {
    pub plan: ScenePlan,
    pub beats: Vec<Beat>,
    /// Prose per beat, same order as `beats`.
    pub segments: Vec<String>,
    pub prose: String,
    /// Provider that answered each call, in call order (plan, decompose, then one per beat).
    pub providers_used: Vec<String>,
}

impl CoWriteOutput {
    pub fn word_count(&self) -> usize {
        self.prose.split_whitespace().count()
    }
}
