//! Single-Response Generator
//!
//! Produces one respondent: prompt, model call, extraction and repair, then
//! answer validation, trait normalization and demographics filtering. Any
//! failure along the model path is absorbed by the fallback generator, so
//! `generate` always returns a structurally valid response.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use survey_synth_core::{
    BusinessContext, DemographicsConfig, GeneratedResponse, QuestionSpec, ResponseSource,
};
use survey_synth_llm::{LlmError, LlmProvider, LlmRequestOptions, Message};
use thiserror::Error;
use tracing::{debug, warn};

use super::config::GenerationConfig;
use super::demographics::filter_demographics;
use super::extraction::PayloadShape;
use super::fallback::fallback_response;
use super::persona::PersonaSeed;
use super::prompt_builder::{build_generation_prompt, PromptInput};
use super::repair::{parse_payload, preview, MalformedPayload};
use super::traits::{apply_jitter, normalize_traits};
use super::validator::{answers_by_question, validate_answers};

const SYSTEM_PROMPT: &str =
    "You are a realistic survey respondent. Reply with a single JSON object and nothing else.";

/// Per-question pacing of a simulated human respondent, in seconds.
const BASE_SECS_PER_QUESTION: i64 = 35;
const JITTER_SECS_PER_QUESTION: i64 = 40;
const MIN_RESPONSE_SECS: i64 = 30;
const MAX_RESPONSE_SECS: i64 = 600;

/// Why the model path failed for one ordinal. Never surfaced to callers.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("malformed output: {message}")]
    Malformed { message: String, preview: String },

    #[error("unexpected payload shape: {0}")]
    Shape(String),
}

impl From<MalformedPayload> for GenerationError {
    fn from(err: MalformedPayload) -> Self {
        GenerationError::Malformed {
            message: err.message,
            preview: err.preview,
        }
    }
}

/// The caller-owned survey inputs shared by every response in a job.
///
/// Questions are expected in display order.
#[derive(Debug, Clone, Copy)]
pub struct SurveyInput<'a> {
    pub questions: &'a [QuestionSpec],
    pub business_context: &'a BusinessContext,
    pub demographics: &'a DemographicsConfig,
}

/// Synthetic start/complete timestamps for a respondent answering
/// `question_count` questions, ending now.
pub fn respondent_window<R: Rng + ?Sized>(
    question_count: usize,
    rng: &mut R,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let secs: i64 = (0..question_count)
        .map(|_| BASE_SECS_PER_QUESTION + rng.gen_range(0..=JITTER_SECS_PER_QUESTION))
        .sum();
    let secs = secs.clamp(MIN_RESPONSE_SECS, MAX_RESPONSE_SECS);
    let completed_at = Utc::now();
    (completed_at - Duration::seconds(secs), completed_at)
}

/// Generates single responses against one provider.
pub struct ResponseGenerator {
    provider: Arc<dyn LlmProvider>,
    config: GenerationConfig,
}

impl ResponseGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: GenerationConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// RNG for one ordinal: reproducible when a seed is configured.
    fn rng_for(&self, ordinal: usize) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(
                seed ^ (ordinal as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
            ),
            None => StdRng::from_entropy(),
        }
    }

    /// Generate the response for a 1-based ordinal. Never fails.
    pub async fn generate(&self, survey: &SurveyInput<'_>, ordinal: usize) -> GeneratedResponse {
        let persona = PersonaSeed::for_ordinal(ordinal);
        let mut rng = self.rng_for(ordinal);

        let raw = match self.request(survey, &persona, ordinal).await {
            Ok(raw) => raw,
            Err(e) => return self.fall_back(survey, &persona, ordinal, &mut rng, e),
        };

        match self.assemble(survey, ordinal, &raw, &mut rng) {
            Ok(response) => response,
            Err(e) => self.fall_back(survey, &persona, ordinal, &mut rng, e),
        }
    }

    /// One model call. The only suspension point of the pipeline.
    async fn request(
        &self,
        survey: &SurveyInput<'_>,
        persona: &PersonaSeed,
        ordinal: usize,
    ) -> Result<String, GenerationError> {
        let prompt = build_generation_prompt(&PromptInput {
            questions: survey.questions,
            business_context: survey.business_context,
            demographics: survey.demographics,
            persona,
            ordinal,
        });
        debug!(ordinal, prompt_len = prompt.len(), "generator: requesting response");

        let options = LlmRequestOptions {
            temperature_override: self.config.temperature,
            ..Default::default()
        };
        let response = self
            .provider
            .send_message(
                vec![Message::user(prompt)],
                Some(SYSTEM_PROMPT.to_string()),
                options,
            )
            .await?;

        response
            .text()
            .map(str::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }

    /// Parse, validate and normalize raw model text into a response.
    fn assemble<R: Rng + ?Sized>(
        &self,
        survey: &SurveyInput<'_>,
        ordinal: usize,
        raw: &str,
        rng: &mut R,
    ) -> Result<GeneratedResponse, GenerationError> {
        let payload = parse_payload(raw, PayloadShape::Object)?;
        let Value::Object(map) = &payload else {
            return Err(GenerationError::Shape(format!(
                "expected a JSON object, got {}",
                preview(&payload.to_string())
            )));
        };

        let parsed_answers = answers_by_question(map.get("answers"));
        let (answers, coerced) = validate_answers(survey.questions, &parsed_answers, rng);

        let mut traits = normalize_traits(map.get("traits"));
        apply_jitter(&mut traits, self.config.trait_jitter, rng);

        let demographics = filter_demographics(
            map.get("demographics"),
            survey.demographics,
            self.config.strict_demographics,
        );

        let (started_at, completed_at) = respondent_window(survey.questions.len(), rng);
        debug!(ordinal, coerced, "generator: response assembled");

        Ok(GeneratedResponse {
            ordinal,
            answers,
            demographics,
            traits,
            started_at,
            completed_at,
            source: ResponseSource::Model,
        })
    }

    fn fall_back<R: Rng + ?Sized>(
        &self,
        survey: &SurveyInput<'_>,
        persona: &PersonaSeed,
        ordinal: usize,
        rng: &mut R,
        error: GenerationError,
    ) -> GeneratedResponse {
        match &error {
            GenerationError::Malformed { message, preview } => warn!(
                ordinal,
                error = %message,
                preview = %preview,
                "generator: malformed model output, using fallback"
            ),
            other => warn!(ordinal, error = %other, "generator: model path failed, using fallback"),
        }
        fallback_response(survey.questions, survey.demographics, persona, ordinal, rng)
    }
}
