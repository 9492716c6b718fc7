//! Generated Response Types
//!
//! Output records of the generation engine. All of them are created and
//! finalized within a single generation call.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::survey::DemographicField;
use crate::traits::TraitScore;

/// One entry of a ranking answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    pub option_id: String,
    pub rank: u32,
}

/// A type-conformant answer value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    /// Selected option identifier
    Choice(String),
    /// Integer on the question's scale
    Number(i64),
    /// Options ordered by rank, ranks 1..K
    Ranking(Vec<RankEntry>),
    /// Free-text answer
    Text(String),
}

impl AnswerValue {
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            AnswerValue::Choice(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_ranking(&self) -> Option<&[RankEntry]> {
        match self {
            AnswerValue::Ranking(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// An answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
}

/// Demographics keyed by field; values are kept as the model returned them.
pub type Demographics = BTreeMap<DemographicField, serde_json::Value>;

/// Where a response's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Parsed from model output (and validated)
    Model,
    /// Synthesized locally after a generation failure
    Fallback,
}

/// A complete synthetic respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResponse {
    /// 1-based position within the job
    pub ordinal: usize,
    pub answers: Vec<Answer>,
    pub demographics: Demographics,
    pub traits: [TraitScore; 5],
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub source: ResponseSource,
}

impl GeneratedResponse {
    pub fn answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| &a.value)
    }

    pub fn answer_mut(&mut self, question_id: &str) -> Option<&mut AnswerValue> {
        self.answers
            .iter_mut()
            .find(|a| a.question_id == question_id)
            .map(|a| &mut a.value)
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ResponseSource::Fallback
    }

    /// Synthetic completion time in seconds.
    pub fn duration_secs(&self) -> i64 {
        (self.completed_at - self.started_at).num_seconds()
    }
}

/// Timing record for one scheduled batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTiming {
    /// 0-based batch number
    pub batch_index: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub item_count: usize,
}
