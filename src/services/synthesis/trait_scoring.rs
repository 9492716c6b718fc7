//! Submission Trait Scoring
//!
//! Derives the five canonical trait scores from a real (non-synthetic)
//! submission. Uses the same extraction, repair and normalization as the
//! generator, but asks the model for a bare JSON array.

use serde_json::Value;
use survey_synth_core::{neutral_traits, BusinessContext, QuestionSpec, TraitName, TraitScore};
use survey_synth_llm::{LlmProvider, LlmRequestOptions};
use tracing::{debug, warn};

use super::extraction::PayloadShape;
use super::prompt_builder::sorted_questions;
use super::repair::parse_payload;
use super::traits::normalize_traits;
use super::validator::answers_by_question;

/// Build the scoring prompt for one submission.
pub fn build_scoring_prompt(
    questions: &[QuestionSpec],
    answers: &Value,
    context: &BusinessContext,
) -> String {
    let by_question = answers_by_question(Some(answers));
    let mut parts = Vec::with_capacity(4);

    parts.push(
        "You are an organizational psychologist. Score the respondent below on five traits \
         using only the evidence in their answers."
            .to_string(),
    );

    if let Some(product) = context.product_name.as_deref().filter(|p| !p.trim().is_empty()) {
        parts.push(format!("\n## Survey Topic\n{}", product.trim()));
    }

    let transcript = sorted_questions(questions)
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let answer = match by_question.get(&q.id) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "(no answer)".to_string(),
                Some(other) => other.to_string(),
            };
            format!("{}. {}\n   Answer: {}", i + 1, q.text.trim(), answer)
        })
        .collect::<Vec<_>>()
        .join("\n");
    parts.push(format!("\n## Answers\n{}", transcript));

    let example = TraitName::ALL
        .iter()
        .map(|t| {
            format!(
                "{{\"name\": \"{}\", \"category\": \"{}\", \"score\": 64}}",
                t.display_name(),
                t.category().as_str()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    parts.push(format!(
        "\n## Output Format\nRespond with ONLY a JSON array of exactly 5 objects, one per trait, \
         scores are integers from 0 to 100:\n[{}]",
        example
    ));

    parts.join("\n")
}

/// Score a real submission. Any failure yields the neutral trait set.
pub async fn score_submission(
    provider: &dyn LlmProvider,
    questions: &[QuestionSpec],
    answers: &Value,
    context: &BusinessContext,
    temperature: Option<f32>,
) -> [TraitScore; 5] {
    let prompt = build_scoring_prompt(questions, answers, context);
    let options = LlmRequestOptions {
        temperature_override: temperature,
        ..Default::default()
    };

    let raw = match provider.complete(&prompt, options).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "trait_scoring: model call failed, using neutral traits");
            return neutral_traits();
        }
    };

    match parse_payload(&raw, PayloadShape::Array) {
        Ok(payload) => {
            debug!(len = raw.len(), "trait_scoring: scores parsed");
            // Tolerate a wrapping {"traits": [...]} object as well
            normalize_traits(Some(payload.get("traits").unwrap_or(&payload)))
        }
        Err(e) => {
            warn!(
                error = %e.message,
                preview = %e.preview,
                "trait_scoring: malformed output, using neutral traits"
            );
            neutral_traits()
        }
    }
}
