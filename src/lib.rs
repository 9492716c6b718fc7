//! Survey Synth - Synthetic Response Generation Engine
//!
//! Generates realistic, structurally valid survey responses by driving an
//! external text model under bounded concurrency and repairing, validating,
//! normalizing and diversifying its output.
//! It includes:
//! - The synthesis services (`services::synthesis`)
//! - Engine-level error types (`utils::error`)
//! - Re-exports of the data model and provider crates

pub mod services;
pub mod utils;

// Re-export the engine surface
pub use services::synthesis::{
    BatchCompletion, BatchObserver, BoxError, DiversityStrategy, EngineConfig, GenerationConfig,
    GenerationOutput, SynthesisEngine, BATCH_SIZE,
};
pub use utils::error::{AppError, AppResult};

// Re-export workspace crates
pub use survey_synth_core;
pub use survey_synth_llm;
