//! Plan → Decompose → Elaborate through `StoryClient::co_write`.

mod common;

use common::{all_keys, client, prompt_of, ScriptedTransport, TEST_KEY};
use quill_ai::clock::ManualClock;
use quill_ai::pipeline::{BeatType, CoWritePipeline};
use quill_ai::{CoWriteOptions, CoWriteRequest, Error, Settings};

const PLAN: &str = r#"```json
{"pov": "Mara", "goal": "Get the Gull back", "conflict": "The harbourmaster wants a bribe",
 "resolution": "She pays with a secret", "setting": "Harbour office, night",
 "opening_line": "The lamp smoked."}
```"#;

const BEATS: &str = r#"{"beats": [
  {"type": "description", "description": "The office at night"},
  {"type": "Dialogue", "description": "Mara demands the papers"},
  {"type": "montage", "description": "She slides the letter across"}
]}"#;

const PROSE: [&str; 3] = [
    "The lamp smoked over a desk buried in manifests.",
    "\"Papers,\" Mara said. \"Now.\"",
    "She slid the letter across and watched him read.",
];

fn script_happy_path(transport: &ScriptedTransport, provider: &str) {
    transport.ok(provider, PLAN);
    transport.ok(provider, BEATS);
    for prose in PROSE {
        transport.ok(provider, prose);
    }
}

fn openai_only() -> Settings {
    Settings::new().with_api_key("openai", TEST_KEY)
}

#[tokio::test]
async fn stages_run_in_order_and_carry_prior_prose() {
    let transport = ScriptedTransport::new();
    script_happy_path(&transport, "openai");
    let client = client(openai_only(), transport.clone(), ManualClock::shared());

    let request = CoWriteRequest::new("Mara confronts the harbourmaster")
        .with_characters(vec!["Mara".into(), "Osk".into()])
        .with_options(
            CoWriteOptions::new()
                .with_tone("tense")
                .with_emotional_intensity(9),
        );
    let output = client.co_write(&request).await.unwrap();

    assert_eq!(output.plan.goal, "Get the Gull back");
    assert_eq!(output.beats.len(), 3);
    assert_eq!(output.beats[0].beat_type, BeatType::Description);
    assert_eq!(output.beats[1].beat_type, BeatType::Dialogue);
    assert_eq!(output.beats[2].beat_type, BeatType::Action);
    assert_eq!(output.segments, PROSE.to_vec());
    assert_eq!(output.prose, PROSE.join("\n\n"));
    assert_eq!(output.providers_used, vec!["openai"; 5]);

    let sent = transport.requests();
    assert_eq!(sent.len(), 5);
    let plan_prompt = prompt_of(&sent[0]);
    assert!(plan_prompt.contains("Mara confronts the harbourmaster"));
    assert!(plan_prompt.contains("Emotional intensity 5/5"));
    assert!(prompt_of(&sent[1]).contains("Goal: Get the Gull back"));

    let first_beat = prompt_of(&sent[2]);
    assert!(first_beat.contains("open with: The lamp smoked."));

    let third_beat = prompt_of(&sent[4]);
    assert!(third_beat.contains(PROSE[0]));
    assert!(third_beat.contains(PROSE[1]));
    assert!(third_beat.contains("beat 3 of 3 (action): She slides the letter across"));
}

#[tokio::test]
async fn rolling_window_keeps_only_trailing_prose() {
    let transport = ScriptedTransport::new();
    script_happy_path(&transport, "openai");
    let client = client(openai_only(), transport.clone(), ManualClock::shared());

    CoWritePipeline::new(&client)
        .with_window_chars(20)
        .run(&CoWriteRequest::new("Mara confronts the harbourmaster"))
        .await
        .unwrap();

    let third_beat = prompt_of(&transport.requests()[4]);
    let joined = format!("{}\n\n{}", PROSE[0], PROSE[1]);
    let tail: String = joined
        .chars()
        .skip(joined.chars().count() - 20)
        .collect();
    assert!(third_beat.contains(&tail));
    assert!(!third_beat.contains(PROSE[0]));
}

#[tokio::test]
async fn stage_failure_aborts_without_partial_prose() {
    let transport = ScriptedTransport::new();
    transport.ok("openai", PLAN);
    transport.ok("openai", BEATS);
    transport.ok("openai", PROSE[0]);
    transport.fail("openai", 500);
    let client = client(openai_only(), transport.clone(), ManualClock::shared());

    let err = client
        .co_write(&CoWriteRequest::new("Mara confronts the harbourmaster"))
        .await
        .unwrap_err();
    match err {
        Error::ProviderHttp {
            provider, status, ..
        } => {
            assert_eq!(provider, "openai");
            assert_eq!(status, 500);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Plan, decompose, beat 1, failed beat 2; beat 3 is never attempted.
    assert_eq!(transport.requests().len(), 4);
}

#[tokio::test]
async fn each_stage_fails_over_independently() {
    let transport = ScriptedTransport::new();
    transport.fail("openai", 503);
    transport.ok("anthropic", PLAN);
    transport.ok("openai", r#"{"beats": []}"#);
    transport.ok("anthropic", r#"[{"type": "emotion", "description": "Dread"}]"#);
    transport.ok("openai", "Dread settled in.");
    let client = client(all_keys(), transport.clone(), ManualClock::shared());

    let output = client
        .co_write(&CoWriteRequest::new("Mara waits"))
        .await
        .unwrap();
    assert_eq!(output.beats.len(), 1);
    assert_eq!(output.beats[0].beat_type, BeatType::Emotion);
    assert_eq!(output.prose, "Dread settled in.");
    assert_eq!(output.providers_used, vec!["anthropic", "anthropic", "openai"]);
    assert_eq!(
        transport.providers_called(),
        vec!["openai", "anthropic", "openai", "anthropic", "openai"]
    );
}

#[tokio::test]
async fn empty_scene_is_rejected_before_any_call() {
    let transport = ScriptedTransport::new();
    let client = client(all_keys(), transport.clone(), ManualClock::shared());

    let err = client
        .co_write(&CoWriteRequest::new("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert!(transport.requests().is_empty());
}
