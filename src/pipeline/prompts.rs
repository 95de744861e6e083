//! Prompt builders for the three co-writing stages.

use super::{Beat, CoWriteOptions, CoWriteRequest, ScenePlan};
use crate::features::json_instructions;
use crate::structured::schema::{BEAT, SCENE_PLAN};

fn style_block(options: &CoWriteOptions) -> String {
    let dialogue = if options.include_dialogue {
        "Include dialogue where it fits."
    } else {
        "Avoid dialogue."
    };
    format!(
        "Style: {} tone, {}, {}. Emotional intensity {}/5. {}",
        options.tone.trim(),
        options.point_of_view.describe(),
        options.tense.describe(),
        options.intensity(),
        dialogue
    )
}

fn chapter_hints(options: &CoWriteOptions) -> String {
    let mut hints = String::new();
    if let Some(prev) = options.previous_chapter.as_deref().map(str::trim) {
        if !prev.is_empty() {
            hints.push_str(&format!("Previous chapter: {}\n", prev));
        }
    }
    if let Some(next) = options.next_chapter.as_deref().map(str::trim) {
        if !next.is_empty() {
            hints.push_str(&format!("Next chapter: {}\n", next));
        }
    }
    hints
}

fn characters_line(request: &CoWriteRequest) -> String {
    if request.characters.is_empty() {
        String::new()
    } else {
        format!("Characters: {}\n", request.characters.join(", "))
    }
}

pub(super) fn plan(request: &CoWriteRequest) -> String {
    format!(
        "You are planning a scene for a novel.\nScene: {}\n{}{}{}\n\nDecide whose point of \
         view it follows, what they want, what stands in the way, how it resolves, where it \
         happens and a strong opening line.\n{}",
        request.scene_description.trim(),
        characters_line(request),
        chapter_hints(&request.options),
        style_block(&request.options),
        json_instructions(&SCENE_PLAN)
    )
}

pub(super) fn decompose(request: &CoWriteRequest, plan: &ScenePlan) -> String {
    format!(
        "Break this scene into an ordered list of beats. Each beat is one action, line of \
         dialogue, emotional turn, description or internal moment.\nScene: {}\n\nPlan:\n{}\n\n\
         Target length: about {} words in total.\n{}",
        request.scene_description.trim(),
        plan.summary(),
        request.options.target_words,
        json_instructions(&BEAT)
    )
}

/// Inputs for one elaboration call.
pub(super) struct ElaborateStep<'a> {
    pub request: &'a CoWriteRequest,
    pub plan: &'a ScenePlan,
    pub beat: &'a Beat,
    pub index: usize,
    pub total: usize,
    pub window: &'a str,
}

pub(super) fn elaborate(step: &ElaborateStep<'_>) -> String {
    let options = &step.request.options;
    let words = (options.target_words as usize / step.total.max(1)).max(50);
    let so_far = if step.window.is_empty() {
        if step.plan.opening_line.trim().is_empty() {
            "(this is the first beat)".to_string()
        } else {
            format!(
                "(this is the first beat; open with: {})",
                step.plan.opening_line.trim()
            )
        }
    } else {
        step.window.to_string()
    };
    format!(
        "You are co-writing a scene.\nPlan:\n{}\n{}\n{}\nStory so far:\n{}\n\nWrite beat {} of \
         {} ({}): {}\nWrite roughly {} words of prose that continue directly from the story \
         so far. Output the prose only.",
        step.plan.summary(),
        style_block(options),
        chapter_hints(options),
        so_far,
        step.index + 1,
        step.total,
        step.beat.beat_type,
        step.beat.description.trim(),
        words
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{BeatType, PointOfView};

    fn request() -> CoWriteRequest {
        CoWriteRequest::new("Mara confronts the harbourmaster")
            .with_characters(vec!["Mara".into(), "Osk".into()])
            .with_options(
                CoWriteOptions::new()
                    .with_tone("tense")
                    .with_point_of_view(PointOfView::FirstPerson)
                    .with_dialogue(false)
                    .with_previous_chapter("The ship was impounded"),
            )
    }

    #[test]
    fn test_plan_prompt() {
        let prompt = plan(&request());
        assert!(prompt.contains("Mara confronts the harbourmaster"));
        assert!(prompt.contains("Characters: Mara, Osk"));
        assert!(prompt.contains("tense tone, first person, past tense"));
        assert!(prompt.contains("Avoid dialogue."));
        assert!(prompt.contains("Previous chapter: The ship was impounded"));
        assert!(prompt.contains("\"opening_line\""));
    }

    #[test]
    fn test_elaborate_prompt_embeds_window_and_beat() {
        let req = request();
        let plan = ScenePlan {
            goal: "Get the ship back".into(),
            ..Default::default()
        };
        let beat = Beat {
            beat_type: BeatType::Dialogue,
            description: "Mara demands the papers".into(),
        };
        let prompt = elaborate(&ElaborateStep {
            request: &req,
            plan: &plan,
            beat: &beat,
            index: 1,
            total: 4,
            window: "The rain had not stopped.",
        });
        assert!(prompt.contains("Goal: Get the ship back"));
        assert!(prompt.contains("The rain had not stopped."));
        assert!(prompt.contains("beat 2 of 4 (dialogue): Mara demands the papers"));
        assert!(prompt.contains("roughly 200 words"));
    }
}
