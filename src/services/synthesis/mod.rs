//! Synthetic Response Generation
//!
//! Populates a survey with realistic, schema-correct respondent data by
//! orchestrating concurrent model calls and then repairing, validating,
//! normalizing and diversifying what comes back:
//! - Persona seeding and prompt building
//! - Payload extraction and syntax repair
//! - Answer validation, trait normalization and demographics filtering
//! - Single-response generation with a network-free fallback
//! - Per-batch diversity enforcement and the bounded batch scheduler
//! - Trait scoring for real submissions

pub mod config;
pub mod demographics;
pub mod diversity;
pub mod engine;
pub mod extraction;
pub mod fallback;
pub mod generator;
pub mod persona;
pub mod prompt_builder;
pub mod repair;
pub mod scheduler;
pub mod trait_scoring;
pub mod traits;
pub mod validator;

pub use config::{DiversityStrategy, EngineConfig, GenerationConfig, BATCH_SIZE};
pub use engine::{resolve_api_key, SynthesisEngine};
pub use generator::{GenerationError, ResponseGenerator, SurveyInput};
pub use persona::PersonaSeed;
pub use scheduler::{
    BatchCompletion, BatchObserver, BatchScheduler, BoxError, GenerationOutput,
};
