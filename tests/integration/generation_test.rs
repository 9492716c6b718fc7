//! End-to-end generation tests
//!
//! Drive `SynthesisEngine::generate` against the scripted provider and check
//! the job-level guarantees: counts, ordering, batching, domains, fallback
//! and diversity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use survey_synth::services::synthesis::GenerationConfig;
use survey_synth::survey_synth_core::{
    AnswerValue, BusinessContext, DemographicField, DemographicsConfig, GeneratedResponse,
    QuestionSpec, QuestionType,
};
use survey_synth::survey_synth_llm::LlmError;
use survey_synth::{BatchCompletion, BatchObserver, BoxError, DiversityStrategy};

use crate::support::{assert_structurally_valid, engine, payload, survey_questions, ScriptedProvider};

fn context() -> BusinessContext {
    BusinessContext {
        product_name: Some("FlowDesk".to_string()),
        product_description: Some("A shared inbox for small support teams".to_string()),
        ..Default::default()
    }
}

fn network_error() -> LlmError {
    LlmError::NetworkError {
        message: "connection reset by peer".to_string(),
    }
}

fn text_answer(response: &GeneratedResponse) -> &str {
    response
        .answer("q_text")
        .and_then(AnswerValue::as_text)
        .unwrap_or_default()
}

/// Records every completed batch; optionally fails each callback.
#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<(usize, usize, usize)>>,
    fail: bool,
}

#[async_trait]
impl BatchObserver for RecordingObserver {
    async fn on_batch_complete(&self, batch: &BatchCompletion<'_>) -> Result<(), BoxError> {
        assert_eq!(batch.responses.len(), batch.item_count);
        self.seen
            .lock()
            .unwrap()
            .push((batch.batch_index, batch.item_count, batch.total_batches));
        if self.fail {
            return Err("progress sink unavailable".into());
        }
        Ok(())
    }
}

// ============================================================================
// Count and ordering
// ============================================================================

#[tokio::test]
async fn test_exact_count_for_various_sizes() {
    let questions = survey_questions();
    let demographics = DemographicsConfig::all();

    for count in [1usize, 4, 5, 6, 11, 23] {
        let provider = Arc::new(ScriptedProvider::new(|ordinal| Ok(payload(ordinal))));
        let engine = engine(provider.clone(), GenerationConfig::default());
        let output = engine
            .generate(&questions, &context(), &demographics, count, None)
            .await;

        assert_eq!(output.responses.len(), count);
        assert_eq!(output.batch_timings.len(), count.div_ceil(5));
        assert_eq!(
            output.batch_timings.iter().map(|t| t.item_count).sum::<usize>(),
            count
        );
        assert_eq!(output.fallback_count, 0);
        assert_eq!(provider.called_ordinals(), (1..=count).collect::<Vec<_>>());
        for (i, response) in output.responses.iter().enumerate() {
            assert_eq!(response.ordinal, i + 1);
        }
    }
}

#[tokio::test]
async fn test_zero_count_makes_no_calls() {
    let provider = Arc::new(ScriptedProvider::new(|ordinal| Ok(payload(ordinal))));
    let engine = engine(provider.clone(), GenerationConfig::default());
    let observer = RecordingObserver::default();

    let output = engine
        .generate(
            &survey_questions(),
            &context(),
            &DemographicsConfig::all(),
            0,
            Some(&observer),
        )
        .await;

    assert!(output.responses.is_empty());
    assert!(output.batch_timings.is_empty());
    assert_eq!(provider.call_count(), 0);
    assert!(observer.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_independent_of_completion_order() {
    // Later ordinals answer first
    let provider = Arc::new(
        ScriptedProvider::new(|ordinal| Ok(payload(ordinal)))
            .with_delay(|ordinal| (13 - ordinal.min(12)) as u64 * 10),
    );
    let engine = engine(provider.clone(), GenerationConfig::default());
    let observer = RecordingObserver::default();

    let output = engine
        .generate(
            &survey_questions(),
            &context(),
            &DemographicsConfig::all(),
            12,
            Some(&observer),
        )
        .await;

    assert_eq!(output.responses.len(), 12);
    for (i, response) in output.responses.iter().enumerate() {
        assert_eq!(response.ordinal, i + 1);
        assert_eq!(text_answer(response), format!("I am respondent {}.", i + 1));
    }

    let indices: Vec<usize> = output.batch_timings.iter().map(|t| t.batch_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    let sizes: Vec<usize> = output.batch_timings.iter().map(|t| t.item_count).collect();
    assert_eq!(sizes, vec![5, 5, 2]);
    for timing in &output.batch_timings {
        assert!(timing.completed_at >= timing.started_at);
    }

    // Three batches fit the default worker pool, so every item overlaps
    assert_eq!(provider.max_in_flight(), 12);

    let mut seen = observer.seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![(0, 5, 3), (1, 5, 3), (2, 2, 3)]);
}

#[tokio::test]
async fn test_concurrency_bounded_by_worker_count() {
    let provider = Arc::new(
        ScriptedProvider::new(|ordinal| Ok(payload(ordinal))).with_delay(|_| 15),
    );
    let config = GenerationConfig {
        max_concurrent_batches: 1,
        ..Default::default()
    };
    let engine = engine(provider.clone(), config);

    let output = engine
        .generate(
            &survey_questions(),
            &context(),
            &DemographicsConfig::all(),
            12,
            None,
        )
        .await;

    assert_eq!(output.responses.len(), 12);
    assert_eq!(provider.max_in_flight(), 5);
    // A single worker runs batches back to back
    for pair in output.batch_timings.windows(2) {
        assert!(pair[1].started_at >= pair[0].completed_at);
    }
}

#[tokio::test]
async fn test_observer_errors_ignored() {
    let provider = Arc::new(ScriptedProvider::new(|ordinal| Ok(payload(ordinal))));
    let engine = engine(provider, GenerationConfig::default());
    let observer = RecordingObserver {
        fail: true,
        ..Default::default()
    };

    let output = engine
        .generate(
            &survey_questions(),
            &context(),
            &DemographicsConfig::all(),
            7,
            Some(&observer),
        )
        .await;

    assert_eq!(output.responses.len(), 7);
    assert_eq!(output.fallback_count, 0);
    assert_eq!(observer.seen.lock().unwrap().len(), 2);
}

// ============================================================================
// Structural validity
// ============================================================================

#[tokio::test]
async fn test_well_formed_payloads_fully_valid() {
    let questions = survey_questions();
    let demographics = DemographicsConfig::all();
    let provider = Arc::new(ScriptedProvider::new(|ordinal| Ok(payload(ordinal))));
    let engine = engine(provider, GenerationConfig::default());

    let output = engine
        .generate(&questions, &context(), &demographics, 10, None)
        .await;

    for response in &output.responses {
        assert!(!response.is_fallback());
        assert_structurally_valid(&questions, &demographics, response);
        assert_eq!(response.demographics.len(), 5);
        assert!(response.completed_at >= response.started_at);
    }
}

#[tokio::test]
async fn test_repairable_payloads_are_not_fallbacks() {
    let questions = survey_questions();
    let demographics = DemographicsConfig::all();
    let provider = Arc::new(ScriptedProvider::new(|ordinal| {
        let body = payload(ordinal);
        let text = match ordinal % 4 {
            0 => format!("Here is the respondent:\n```json\n{}\n```\nLet me know!", body),
            1 => {
                // trailing comma before the final brace
                let cut = body.len() - 1;
                format!("{},}}", &body[..cut])
            }
            // truncated mid-stream
            2 => body[..body.len() - 2].to_string(),
            _ => format!("Sure. {} Hope that helps.", body),
        };
        Ok(text)
    }));
    let engine = engine(provider, GenerationConfig::default());

    let output = engine
        .generate(&questions, &context(), &demographics, 8, None)
        .await;

    assert_eq!(output.fallback_count, 0);
    for (i, response) in output.responses.iter().enumerate() {
        assert_structurally_valid(&questions, &demographics, response);
        assert_eq!(text_answer(response), format!("I am respondent {}.", i + 1));
    }
}

#[tokio::test]
async fn test_out_of_domain_answers_coerced() {
    let questions = survey_questions();
    let demographics = DemographicsConfig::all();
    let provider = Arc::new(ScriptedProvider::new(|_| {
        Ok(json!({
            "answers": [
                {"questionId": "q_color", "answer": "purple"},
                {"questionId": "q_scale", "answer": 99},
                {"questionId": "q_rank", "answer": ["speed", "price"]},
                {"questionId": "q_text", "answer": "N/A"},
                {"questionId": "q_image", "answer": "mountains"}
            ],
            "traits": {"Innovation": 250, "Creativity": -4}
        })
        .to_string())
    }));
    let engine = engine(provider, GenerationConfig::default());

    let output = engine
        .generate(&questions, &context(), &demographics, 1, None)
        .await;
    let response = &output.responses[0];

    assert!(!response.is_fallback());
    assert_structurally_valid(&questions, &demographics, response);
    assert_ne!(text_answer(response), "N/A");
    // labels resolve to option ids
    assert_eq!(
        response.answer("q_image").and_then(AnswerValue::as_choice),
        Some("img1")
    );
    // no demographics object in the payload
    assert!(response.demographics.is_empty());
}

#[tokio::test]
async fn test_demographics_allow_list() {
    let questions = survey_questions();
    let demographics = DemographicsConfig {
        collect_age: true,
        collect_location: true,
        ..Default::default()
    };
    let provider = Arc::new(ScriptedProvider::new(|ordinal| Ok(payload(ordinal))));
    let engine = engine(provider, GenerationConfig::default());

    let output = engine
        .generate(&questions, &context(), &demographics, 5, None)
        .await;

    for response in &output.responses {
        assert_structurally_valid(&questions, &demographics, response);
        let keys: Vec<DemographicField> = response.demographics.keys().copied().collect();
        assert_eq!(keys, vec![DemographicField::Age, DemographicField::Location]);
    }
}

#[tokio::test]
async fn test_strict_demographics_drop_unknown_values() {
    let questions = survey_questions();
    let demographics = DemographicsConfig::all();
    let provider = Arc::new(ScriptedProvider::new(|ordinal| {
        let mut value: serde_json::Value = serde_json::from_str(&payload(ordinal)).unwrap();
        value["demographics"]["location"] = json!("Mars");
        Ok(value.to_string())
    }));

    let lenient = engine(provider.clone(), GenerationConfig::default());
    let output = lenient
        .generate(&questions, &context(), &demographics, 1, None)
        .await;
    assert_eq!(
        output.responses[0].demographics.get(&DemographicField::Location),
        Some(&json!("Mars"))
    );

    let strict = engine(
        provider,
        GenerationConfig {
            strict_demographics: true,
            ..Default::default()
        },
    );
    let output = strict
        .generate(&questions, &context(), &demographics, 1, None)
        .await;
    let kept = &output.responses[0].demographics;
    assert!(!kept.contains_key(&DemographicField::Location));
    assert_eq!(kept.len(), 4);
}

// ============================================================================
// Fallback
// ============================================================================

#[tokio::test]
async fn test_failed_calls_fall_back() {
    let questions = survey_questions();
    let demographics = DemographicsConfig::all();
    let provider = Arc::new(ScriptedProvider::new(|ordinal| {
        if ordinal % 2 == 0 {
            Err(network_error())
        } else {
            Ok(payload(ordinal))
        }
    }));
    let engine = engine(provider, GenerationConfig::default());

    let output = engine
        .generate(&questions, &context(), &demographics, 12, None)
        .await;

    assert_eq!(output.responses.len(), 12);
    assert_eq!(output.fallback_count, 6);
    for response in &output.responses {
        assert_eq!(response.is_fallback(), response.ordinal % 2 == 0);
        assert_structurally_valid(&questions, &demographics, response);
        if response.is_fallback() {
            assert!(response.traits.iter().all(|t| t.score == 50));
            assert_eq!(response.demographics.len(), 5);
        }
    }
}

#[tokio::test]
async fn test_unparseable_output_falls_back() {
    let questions = survey_questions();
    let demographics = DemographicsConfig::all();
    let provider = Arc::new(ScriptedProvider::new(|ordinal| match ordinal {
        1 => Ok("I'm sorry, I can't help with that request.".to_string()),
        2 => Ok(String::new()),
        _ => Ok("[1, 2, 3]".to_string()),
    }));
    let engine = engine(provider, GenerationConfig::default());

    let output = engine
        .generate(&questions, &context(), &demographics, 3, None)
        .await;

    assert_eq!(output.fallback_count, 3);
    for response in &output.responses {
        assert_structurally_valid(&questions, &demographics, response);
    }
}

#[tokio::test]
async fn test_seeded_runs_reproducible() {
    let questions = survey_questions();
    let demographics = DemographicsConfig::all();
    let config = GenerationConfig {
        seed: Some(7),
        ..Default::default()
    };

    let mut runs = Vec::new();
    for _ in 0..2 {
        let provider = Arc::new(ScriptedProvider::new(|ordinal| {
            if ordinal % 3 == 0 {
                Ok(payload(ordinal))
            } else {
                Err(network_error())
            }
        }));
        let engine = engine(provider, config.clone());
        let output = engine
            .generate(&questions, &context(), &demographics, 9, None)
            .await;
        let snapshot: Vec<_> = output
            .responses
            .into_iter()
            .map(|r| (r.answers, r.traits, r.demographics))
            .collect();
        runs.push(snapshot);
    }
    assert_eq!(runs[0], runs[1]);
}

// ============================================================================
// Diversity
// ============================================================================

fn binary_question() -> Vec<QuestionSpec> {
    vec![QuestionSpec::new("q", "Would you pay for this?", QuestionType::MultipleChoice)
        .with_options([("a", "Yes"), ("b", "No")])]
}

fn uniform_choice_provider() -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::new(|_| {
        Ok(r#"{"answers": [{"questionId": "q", "answer": "a"}]}"#.to_string())
    }))
}

fn choice_counts(responses: &[GeneratedResponse]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for response in responses {
        let id = response.answer("q").and_then(AnswerValue::as_choice).unwrap();
        *counts.entry(id.to_string()).or_insert(0) += 1;
    }
    counts
}

#[tokio::test]
async fn test_uniform_batch_rebalanced() {
    let engine = engine(uniform_choice_provider(), GenerationConfig::default());
    let output = engine
        .generate(
            &binary_question(),
            &context(),
            &DemographicsConfig::default(),
            4,
            None,
        )
        .await;

    let counts = choice_counts(&output.responses);
    assert_eq!(counts.get("a"), Some(&2));
    assert_eq!(counts.get("b"), Some(&2));
}

#[tokio::test]
async fn test_diversity_applies_per_batch() {
    let engine = engine(uniform_choice_provider(), GenerationConfig::default());
    let output = engine
        .generate(
            &binary_question(),
            &context(),
            &DemographicsConfig::default(),
            10,
            None,
        )
        .await;

    // ceil(5 / 2) = 3 per option in each batch of five
    for batch in output.responses.chunks(5) {
        let counts = choice_counts(batch);
        assert_eq!(counts.get("a"), Some(&3));
        assert_eq!(counts.get("b"), Some(&2));
    }
}

#[tokio::test]
async fn test_diversity_disabled_keeps_answers() {
    let config = GenerationConfig {
        diversity: DiversityStrategy::Disabled,
        ..Default::default()
    };
    let engine = engine(uniform_choice_provider(), config);
    let output = engine
        .generate(
            &binary_question(),
            &context(),
            &DemographicsConfig::default(),
            4,
            None,
        )
        .await;

    assert_eq!(choice_counts(&output.responses).get("a"), Some(&4));
}
