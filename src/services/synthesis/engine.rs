//! Synthesis Engine
//!
//! Public entry point: owns the provider and generation settings, and
//! exposes job-level generation plus trait scoring for real submissions.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use survey_synth_core::{BusinessContext, DemographicsConfig, QuestionSpec, TraitScore};
use survey_synth_llm::{create_provider, LlmProvider, ProviderConfig};
use tracing::info;

use super::config::{EngineConfig, GenerationConfig};
use super::generator::{ResponseGenerator, SurveyInput};
use super::prompt_builder::sorted_questions;
use super::scheduler::{BatchObserver, BatchScheduler, GenerationOutput};
use super::trait_scoring::score_submission;
use crate::utils::error::{AppError, AppResult};

/// Fill in a missing API key from the provider's environment variable.
pub fn resolve_api_key(config: &mut ProviderConfig) -> AppResult<()> {
    resolve_api_key_with(config, |var| std::env::var(var).ok())
}

fn resolve_api_key_with(
    config: &mut ProviderConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> AppResult<()> {
    if config.has_api_key() {
        return Ok(());
    }
    let var = config.provider.api_key_env_var();
    match lookup(var).filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            config.api_key = Some(key);
            Ok(())
        }
        None => Err(AppError::config(format!(
            "no API key configured for {}: set provider.api_key or {}",
            config.provider, var
        ))),
    }
}

/// The synthetic response generation engine.
pub struct SynthesisEngine {
    provider: Arc<dyn LlmProvider>,
    generator: ResponseGenerator,
}

impl SynthesisEngine {
    /// Build an engine from configuration.
    ///
    /// Fails fast with `AppError::Config` when no provider credential can be
    /// found or the configuration is invalid. This is the only error the
    /// engine ever surfaces.
    pub fn new(mut config: EngineConfig) -> AppResult<Self> {
        config.validate()?;
        resolve_api_key(&mut config.provider)?;
        let provider = create_provider(config.provider)
            .map_err(|e| AppError::config(format!("failed to initialise provider: {}", e)))?;
        Self::with_provider(provider, config.generation)
    }

    /// Build an engine around an existing provider.
    pub fn with_provider(
        provider: Arc<dyn LlmProvider>,
        generation: GenerationConfig,
    ) -> AppResult<Self> {
        generation.validate().map_err(AppError::config)?;
        let generator = ResponseGenerator::new(provider.clone(), generation);
        Ok(Self {
            provider,
            generator,
        })
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        self.generator.config()
    }

    /// Verify the provider is reachable and the credential is accepted.
    pub async fn health_check(&self) -> AppResult<()> {
        self.provider.health_check().await?;
        Ok(())
    }

    /// Generate `count` synthetic responses.
    ///
    /// Always returns exactly `count` responses ordered by ordinal, plus one
    /// timing entry per batch. Provider failures degrade individual responses
    /// to fallback content instead of failing the job.
    pub async fn generate(
        &self,
        questions: &[QuestionSpec],
        business_context: &BusinessContext,
        demographics: &DemographicsConfig,
        count: usize,
        observer: Option<&dyn BatchObserver>,
    ) -> GenerationOutput {
        let ordered: Vec<QuestionSpec> = sorted_questions(questions).into_iter().cloned().collect();
        let survey = SurveyInput {
            questions: &ordered,
            business_context,
            demographics,
        };

        info!(
            count,
            questions = ordered.len(),
            provider = self.provider.name(),
            model = self.provider.model(),
            "engine: generation started"
        );
        let clock = Instant::now();

        let output = BatchScheduler::new(&self.generator)
            .run(&survey, count, observer)
            .await;

        info!(
            count = output.responses.len(),
            batches = output.batch_timings.len(),
            fallback_count = output.fallback_count,
            duration_ms = clock.elapsed().as_millis() as u64,
            "engine: generation finished"
        );
        output
    }

    /// Score the five canonical traits for a real submission.
    ///
    /// `answers` is either `[{"questionId", "answer"}]` or a
    /// `{"<questionId>": answer}` map. Never fails: any provider or parse
    /// failure yields the neutral trait set.
    pub async fn score_traits_from_submission(
        &self,
        questions: &[QuestionSpec],
        answers: &Value,
        context: &BusinessContext,
    ) -> [TraitScore; 5] {
        score_submission(
            self.provider.as_ref(),
            questions,
            answers,
            context,
            self.generator.config().temperature,
        )
        .await
    }
}
