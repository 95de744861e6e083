//! Plan → Decompose → Elaborate execution.

use tracing::info;

use super::prompts::{self, ElaborateStep};
use super::{
    Beat, CoWriteOutput, CoWriteRequest, PipelineContext, ScenePlan, DEFAULT_WINDOW_CHARS,
};
use crate::client::types::{CanonicalRequest, TemperaturePreset};
use crate::client::StoryClient;
use crate::structured::schema::{BEAT, SCENE_PLAN};
use crate::structured::{parse_items, parse_object};
use crate::{Error, Result};

const PLAN_MAX_TOKENS: u32 = 1024;
const DECOMPOSE_MAX_TOKENS: u32 = 1536;
const ELABORATE_MAX_TOKENS: u32 = 2048;

/// Runs one co-writing request against a [`StoryClient`]. Stages and beats run strictly in
/// order; there is no fan-out and no retry beyond the client's own failover.
#[derive(Debug, Clone, Copy)]
pub struct CoWritePipeline<'a> {
    client: &'a StoryClient,
    window_chars: usize,
}

impl<'a> CoWritePipeline<'a> {
    pub fn new(client: &'a StoryClient) -> Self {
        Self {
            client,
            window_chars: DEFAULT_WINDOW_CHARS,
        }
    }

    pub fn with_window_chars(mut self, window_chars: usize) -> Self {
        self.window_chars = window_chars;
        self
    }

    fn canonical(
        &self,
        request: &CoWriteRequest,
        prompt: String,
        preset: TemperaturePreset,
        max_tokens: u32,
    ) -> CanonicalRequest {
        let mut canonical = CanonicalRequest::new(prompt)
            .with_preset(preset)
            .with_max_output_tokens(max_tokens);
        canonical.preferred_provider = request.preferred_provider.clone();
        canonical.preferred_model = request.preferred_model.clone();
        canonical
    }

    pub async fn run(&self, request: &CoWriteRequest) -> Result<CoWriteOutput> {
        request.validate()?;
        let mut providers_used = Vec::new();

        info!(stage = "plan", "co-write stage started");
        let planned = self
            .client
            .generate_parsed(
                &self.canonical(
                    request,
                    prompts::plan(request),
                    TemperaturePreset::Analytical,
                    PLAN_MAX_TOKENS,
                ),
                |text| parse_object(text, &SCENE_PLAN),
            )
            .await?;
        let plan = ScenePlan::from_item(&planned.value);
        providers_used.push(planned.provider_used);

        let mut context = PipelineContext::new(self.window_chars);
        context.set_plan_output(plan.summary());

        info!(stage = "decompose", "co-write stage started");
        let decomposed = self
            .client
            .generate_parsed(
                &self.canonical(
                    request,
                    prompts::decompose(request, &plan),
                    TemperaturePreset::Analytical,
                    DECOMPOSE_MAX_TOKENS,
                ),
                |text| {
                    let items = parse_items(text, &BEAT)?;
                    if items.is_empty() {
                        return Err(Error::malformed("scene decomposition returned no beats"));
                    }
                    Ok(items)
                },
            )
            .await?;
        let beats: Vec<Beat> = decomposed.value.iter().map(Beat::from_item).collect();
        providers_used.push(decomposed.provider_used);

        let total = beats.len();
        for (index, beat) in beats.iter().enumerate() {
            info!(
                stage = "elaborate",
                beat = index + 1,
                total,
                beat_type = beat.beat_type.as_str(),
                "co-write stage started"
            );
            let window = context.rolling_window();
            let prompt = prompts::elaborate(&ElaborateStep {
                request,
                plan: &plan,
                beat,
                index,
                total,
                window: &window,
            });
            let written = self
                .client
                .generate_parsed(
                    &self.canonical(
                        request,
                        prompt,
                        TemperaturePreset::Creative,
                        ELABORATE_MAX_TOKENS,
                    ),
                    |text| {
                        let prose = text.trim();
                        if prose.is_empty() {
                            return Err(Error::malformed("beat elaboration returned no prose"));
                        }
                        Ok(prose.to_string())
                    },
                )
                .await?;
            context.push_step(written.value);
            providers_used.push(written.provider_used);
        }

        let segments = context.step_outputs().to_vec();
        let prose = context.full_text();
        info!(
            beats = total,
            words = prose.split_whitespace().count(),
            "co-write finished"
        );
        Ok(CoWriteOutput {
            plan,
            beats,
            segments,
            prose,
            providers_used,
        })
    }
}
