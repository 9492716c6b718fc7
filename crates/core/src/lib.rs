//! Survey Synth Core
//!
//! Foundational data model and error types for the synthetic survey response
//! engine. This crate has no dependency on the model provider layer or on the
//! engine itself.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `survey` - Caller-owned survey inputs (questions, business context, demographics config)
//! - `traits` - The closed five-trait taxonomy and `TraitScore`
//! - `response` - Generated responses, answers and batch timings
//! - `proxy` - Proxy configuration shared with the provider crate

pub mod error;
pub mod proxy;
pub mod response;
pub mod survey;
pub mod traits;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Survey Inputs ──────────────────────────────────────────────────────
pub use survey::{
    AnswerKind, BusinessContext, DemographicField, DemographicsConfig, QuestionConfig,
    QuestionOption, QuestionSpec, QuestionType,
};

// ── Trait Taxonomy ─────────────────────────────────────────────────────
pub use traits::{neutral_traits, TraitCategory, TraitName, TraitScore};

// ── Generated Output ───────────────────────────────────────────────────
pub use response::{
    Answer, AnswerValue, BatchTiming, Demographics, GeneratedResponse, RankEntry, ResponseSource,
};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
