//! Error Handling
//!
//! Unified error types for the engine.
//! Uses thiserror for ergonomic error definitions.

use survey_synth_llm::LlmError;
use thiserror::Error;

/// Engine-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (missing credential, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model provider errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for engine errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this is a construction-time configuration failure.
    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}
