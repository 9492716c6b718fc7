//! Submission trait scoring tests

use std::sync::Arc;

use serde_json::json;
use survey_synth::services::synthesis::GenerationConfig;
use survey_synth::survey_synth_core::{neutral_traits, BusinessContext, TraitName, TraitScore};
use survey_synth::survey_synth_llm::LlmError;

use crate::support::{engine, survey_questions, ScriptedProvider};

fn scores(traits: &[TraitScore; 5]) -> Vec<u8> {
    traits.iter().map(|t| t.score).collect()
}

fn submission() -> serde_json::Value {
    json!([
        {"questionId": "q_color", "answer": "blue"},
        {"questionId": "q_scale", "answer": 6},
        {"questionId": "q_text", "answer": "I usually end up organising the team."}
    ])
}

#[tokio::test]
async fn test_scores_parsed_and_canonicalized() {
    let provider = Arc::new(ScriptedProvider::new(|_| {
        Ok("```json\n[\n  {\"name\": \"Leadership\", \"score\": 88},\n  {\"name\": \"innovation\", \"score\": 61.6},\n  {\"name\": \"Creativity\", \"score\": \"40\"}\n]\n```".to_string())
    }));
    let engine = engine(provider.clone(), GenerationConfig::default());

    let traits = engine
        .score_traits_from_submission(&survey_questions(), &submission(), &BusinessContext::default())
        .await;

    assert_eq!(provider.call_count(), 1);
    for (t, name) in traits.iter().zip(TraitName::ALL) {
        assert_eq!(t.name, name);
        assert_eq!(t.category, name.category());
    }
    // Innovation, Analytical Thinking, Leadership, Adaptability, Creativity
    assert_eq!(scores(&traits), vec![62, 50, 88, 50, 40]);
}

#[tokio::test]
async fn test_no_jitter_on_submission_scores() {
    let provider = Arc::new(ScriptedProvider::new(|_| {
        Ok(r#"[{"name": "Adaptability", "score": 73}]"#.to_string())
    }));
    let engine = engine(provider, GenerationConfig::default());

    for _ in 0..5 {
        let traits = engine
            .score_traits_from_submission(&survey_questions(), &json!({}), &BusinessContext::default())
            .await;
        assert_eq!(scores(&traits), vec![50, 50, 50, 73, 50]);
    }
}

#[tokio::test]
async fn test_provider_failure_yields_neutral() {
    let provider = Arc::new(ScriptedProvider::new(|_| {
        Err(LlmError::NetworkError {
            message: "timed out".to_string(),
        })
    }));
    let engine = engine(provider, GenerationConfig::default());

    let traits = engine
        .score_traits_from_submission(&survey_questions(), &submission(), &BusinessContext::default())
        .await;
    assert_eq!(traits, neutral_traits());
}

#[tokio::test]
async fn test_unparseable_reply_yields_neutral() {
    let provider = Arc::new(ScriptedProvider::new(|_| {
        Ok("These answers suggest a thoughtful person.".to_string())
    }));
    let engine = engine(provider, GenerationConfig::default());

    let traits = engine
        .score_traits_from_submission(&survey_questions(), &submission(), &BusinessContext::default())
        .await;
    assert_eq!(traits, neutral_traits());
}
