//! Engine Configuration
//!
//! `GenerationConfig` tunes a generation job; `EngineConfig` bundles it with
//! the provider settings and can be loaded from a JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use survey_synth_llm::ProviderConfig;
use tracing::debug;

use super::traits::DEFAULT_TRAIT_JITTER;
use crate::utils::error::{AppError, AppResult};

/// Number of responses generated per batch.
pub const BATCH_SIZE: usize = 5;

/// Per-batch rebalancing of over-concentrated option choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityStrategy {
    /// Keep answers exactly as validated
    Disabled,
    /// Single in-order pass reassigning answers past the fairness threshold
    #[default]
    ForwardPass,
}

/// Tuning for one generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Maximum number of batches in flight at once
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
    /// Diversity post-processing applied to each completed batch
    #[serde(default)]
    pub diversity: DiversityStrategy,
    /// Drop demographic values outside the prompted enumerations
    #[serde(default)]
    pub strict_demographics: bool,
    /// Amplitude of the uniform noise added to model-derived trait scores
    #[serde(default = "default_trait_jitter")]
    pub trait_jitter: u8,
    /// Sampling temperature override forwarded to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Seed for reproducible fallback, coercion and jitter draws
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_max_concurrent_batches() -> usize {
    3
}

fn default_trait_jitter() -> u8 {
    DEFAULT_TRAIT_JITTER
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_batches: default_max_concurrent_batches(),
            diversity: DiversityStrategy::default(),
            strict_demographics: false,
            trait_jitter: default_trait_jitter(),
            temperature: None,
            seed: None,
        }
    }
}

impl GenerationConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_batches == 0 {
            return Err("maxConcurrentBatches must be at least 1".to_string());
        }
        if self.trait_jitter > 50 {
            return Err(format!(
                "traitJitter must be between 0 and 50, got {}",
                self.trait_jitter
            ));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("temperature must be between 0.0 and 2.0, got {}", t));
            }
        }
        Ok(())
    }
}

/// Provider plus generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl EngineConfig {
    pub fn new(provider: ProviderConfig, generation: GenerationConfig) -> Self {
        Self {
            provider,
            generation,
        }
    }

    /// Load and validate configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), provider = ?config.provider.provider, "config: loaded engine config");
        Ok(config)
    }

    /// Validate everything except credential presence, which is resolved
    /// when the engine is built.
    pub fn validate(&self) -> AppResult<()> {
        self.generation.validate().map_err(AppError::config)?;
        if self.provider.model.trim().is_empty() {
            return Err(AppError::config("provider model must not be empty"));
        }
        if self.provider.timeout_secs == 0 {
            return Err(AppError::config("provider timeout_secs must be at least 1"));
        }
        Ok(())
    }
}
