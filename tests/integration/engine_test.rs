//! Engine construction and payload recovery tests

use std::io::Write;

use serde_json::json;
use survey_synth::services::synthesis::extraction::{extract_payload, PayloadShape};
use survey_synth::services::synthesis::repair::parse_payload;
use survey_synth::survey_synth_llm::{ProviderConfig, ProviderType};
use survey_synth::{DiversityStrategy, EngineConfig, GenerationConfig, SynthesisEngine};
use tempfile::NamedTempFile;

use crate::support::init_tracing;

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_engine_from_config_file() {
    init_tracing();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"{
            "provider": {"provider": "openai", "model": "gpt-4o-mini", "api_key": "sk-test"},
            "generation": {"maxConcurrentBatches": 4, "diversity": "disabled"}
        }"#,
    )
    .unwrap();

    let config = EngineConfig::load(file.path()).unwrap();
    let engine = SynthesisEngine::new(config).unwrap();

    assert_eq!(engine.provider().name(), "openai");
    assert_eq!(engine.provider().model(), "gpt-4o-mini");
    assert_eq!(engine.generation_config().max_concurrent_batches, 4);
    assert_eq!(engine.generation_config().diversity, DiversityStrategy::Disabled);
}

#[test]
fn test_invalid_config_file_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"provider": {"provider": "anthropic", "model": ""}}"#)
        .unwrap();
    let err = EngineConfig::load(file.path()).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_missing_credential_is_config_error() {
    let var = ProviderType::OpenAI.api_key_env_var();
    // Only meaningful when the environment does not supply a key
    if std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false) {
        return;
    }
    let config = EngineConfig::new(
        ProviderConfig::for_provider(ProviderType::OpenAI),
        GenerationConfig::default(),
    );
    let err = SynthesisEngine::new(config).err().unwrap();
    assert!(err.is_config());
    assert!(err.to_string().contains(var));
}

// ============================================================================
// Payload recovery
// ============================================================================

#[test]
fn test_fenced_payload_extracted() {
    let raw = "Sure! ```json\n{\"a\": 1}\n``` thanks";
    assert_eq!(extract_payload(raw, PayloadShape::Object), "{\"a\": 1}");
    assert_eq!(parse_payload(raw, PayloadShape::Object).unwrap(), json!({"a": 1}));
}

#[test]
fn test_loose_syntax_repaired() {
    let value = parse_payload("{'name': 'Innovation', score: 75,}", PayloadShape::Object).unwrap();
    assert_eq!(value, json!({"name": "Innovation", "score": 75}));
}

#[test]
fn test_truncated_payload_balanced() {
    let raw = r#"Here you go: {"answers": [{"questionId": "q1", "answer": "yes"#;
    let value = parse_payload(raw, PayloadShape::Object).unwrap();
    assert_eq!(value["answers"][0]["answer"], "yes");
}

#[test]
fn test_hopeless_payload_reports_preview() {
    let err = parse_payload("no json here at all", PayloadShape::Object).unwrap_err();
    assert!(err.preview.contains("no json here"));
}
