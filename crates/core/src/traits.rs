//! Respondent Trait Taxonomy
//!
//! The closed set of five traits every generated response is scored on. Each
//! trait carries a fixed category, so a (name, category) pair can never drift.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lowest allowed trait score.
pub const MIN_TRAIT_SCORE: u8 = 0;

/// Highest allowed trait score.
pub const MAX_TRAIT_SCORE: u8 = 100;

/// Score used when a trait is missing or unscorable.
pub const NEUTRAL_TRAIT_SCORE: u8 = 50;

/// Trait categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitCategory {
    Behavioral,
    Cognitive,
    Social,
}

impl TraitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraitCategory::Behavioral => "behavioral",
            TraitCategory::Cognitive => "cognitive",
            TraitCategory::Social => "social",
        }
    }
}

/// The five canonical traits, declared in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitName {
    Innovation,
    #[serde(rename = "Analytical Thinking")]
    AnalyticalThinking,
    Leadership,
    Adaptability,
    Creativity,
}

impl TraitName {
    /// Canonical order used for every emitted trait array.
    pub const ALL: [TraitName; 5] = [
        TraitName::Innovation,
        TraitName::AnalyticalThinking,
        TraitName::Leadership,
        TraitName::Adaptability,
        TraitName::Creativity,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            TraitName::Innovation => "Innovation",
            TraitName::AnalyticalThinking => "Analytical Thinking",
            TraitName::Leadership => "Leadership",
            TraitName::Adaptability => "Adaptability",
            TraitName::Creativity => "Creativity",
        }
    }

    pub fn category(&self) -> TraitCategory {
        match self {
            TraitName::Innovation | TraitName::Adaptability => TraitCategory::Behavioral,
            TraitName::AnalyticalThinking | TraitName::Creativity => TraitCategory::Cognitive,
            TraitName::Leadership => TraitCategory::Social,
        }
    }
}

impl fmt::Display for TraitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TraitName {
    type Err = CoreError;

    /// Case-insensitive; spaces, underscores and hyphens are ignored so that
    /// "analytical_thinking" and "AnalyticalThinking" both resolve.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        TraitName::ALL
            .into_iter()
            .find(|t| {
                t.display_name()
                    .chars()
                    .filter(|c| *c != ' ')
                    .flat_map(char::to_lowercase)
                    .eq(folded.chars())
            })
            .ok_or_else(|| CoreError::parse(format!("unknown trait: {}", s)))
    }
}

/// A scored trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitScore {
    pub name: TraitName,
    pub category: TraitCategory,
    pub score: u8,
}

impl TraitScore {
    /// Build a score for `name`, clamping to 0..=100 and deriving the category.
    pub fn new(name: TraitName, score: i64) -> Self {
        Self {
            name,
            category: name.category(),
            score: score.clamp(MIN_TRAIT_SCORE as i64, MAX_TRAIT_SCORE as i64) as u8,
        }
    }

    pub fn neutral(name: TraitName) -> Self {
        Self::new(name, NEUTRAL_TRAIT_SCORE as i64)
    }
}

/// The neutral trait set: every canonical trait at 50.
pub fn neutral_traits() -> [TraitScore; 5] {
    TraitName::ALL.map(TraitScore::neutral)
}
