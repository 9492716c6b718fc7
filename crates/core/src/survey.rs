//! Survey Definition Types
//!
//! Caller-owned, immutable inputs to the generation engine: the questions of a
//! survey, the business context used to enrich prompts, and the demographic
//! fields the survey collects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default lower bound for slider/numeric questions without explicit config.
pub const DEFAULT_SLIDER_MIN: i64 = 1;

/// Default upper bound for slider/numeric questions without explicit config.
pub const DEFAULT_SLIDER_MAX: i64 = 10;

/// Question types supported by the survey builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Open-ended text answer
    #[serde(alias = "free_text", alias = "open_ended")]
    Text,
    /// Pick exactly one option
    #[serde(alias = "single_select", alias = "single_choice")]
    MultipleChoice,
    /// Scenario prompt followed by options
    Scenario,
    /// Pick one image
    #[serde(alias = "image")]
    ImageChoice,
    /// Pick one mood board
    MoodBoard,
    /// Matrix collapsed to a single option pick
    Matrix,
    /// Integer on a bounded scale
    #[serde(alias = "numeric", alias = "rating", alias = "scale")]
    Slider,
    /// Order every option
    Ranking,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Scenario => "scenario",
            QuestionType::ImageChoice => "image_choice",
            QuestionType::MoodBoard => "mood_board",
            QuestionType::Matrix => "matrix",
            QuestionType::Slider => "slider",
            QuestionType::Ranking => "ranking",
        }
    }

    /// Whether the type shares "select one option identifier" semantics.
    pub fn is_option_bearing(&self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoice
                | QuestionType::Scenario
                | QuestionType::ImageChoice
                | QuestionType::MoodBoard
                | QuestionType::Matrix
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_lowercase()))
            .map_err(|_| CoreError::parse(format!("unknown question type: {}", s)))
    }
}

/// The answer domain a question is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// One of the declared option identifiers
    Choice,
    /// Integer within the slider bounds
    Numeric,
    /// Permutation of all options with ranks 1..K
    Ranking,
    /// Non-placeholder free text
    FreeText,
}

/// A selectable choice. `id` is what answers reference; `label` is display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    #[serde(alias = "value")]
    pub id: String,
    #[serde(default, alias = "text")]
    pub label: String,
}

impl QuestionOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Type-specific question configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionConfig {
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label: Option<String>,
}

/// A single survey question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSpec {
    pub id: String,
    #[serde(alias = "question")]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(default)]
    pub config: QuestionConfig,
}

impl QuestionSpec {
    pub fn new(id: impl Into<String>, text: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            question_type,
            order: 0,
            required: false,
            help_text: None,
            scenario: None,
            config: QuestionConfig::default(),
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_options<I, A, B>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        self.config.options = options
            .into_iter()
            .map(|(id, label)| QuestionOption::new(id, label))
            .collect();
        self
    }

    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.config.min = Some(min);
        self.config.max = Some(max);
        self
    }

    /// Answer domain for this question.
    ///
    /// An option-bearing question without options (typically a bare
    /// scenario) is answered in free text.
    pub fn answer_kind(&self) -> AnswerKind {
        match self.question_type {
            QuestionType::Text => AnswerKind::FreeText,
            t if t.is_option_bearing() && self.config.options.is_empty() => AnswerKind::FreeText,
            QuestionType::Slider => AnswerKind::Numeric,
            QuestionType::Ranking => AnswerKind::Ranking,
            _ => AnswerKind::Choice,
        }
    }

    pub fn options(&self) -> &[QuestionOption] {
        &self.config.options
    }

    pub fn has_option(&self, id: &str) -> bool {
        self.config.options.iter().any(|o| o.id == id)
    }

    /// Inclusive slider bounds, defaulting to 1..=10 and swapped when inverted.
    pub fn slider_bounds(&self) -> (i64, i64) {
        let min = self.config.min.unwrap_or(DEFAULT_SLIDER_MIN);
        let max = self.config.max.unwrap_or(DEFAULT_SLIDER_MAX);
        if min <= max {
            (min, max)
        } else {
            (max, min)
        }
    }
}

/// Optional product/business fields used only to enrich the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_market: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pain_points: Vec<String>,
}

impl BusinessContext {
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none()
            && self.product_description.is_none()
            && self.industry.is_none()
            && self.target_market.is_none()
            && self.pain_points.is_empty()
    }
}

/// Demographic fields a survey may collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemographicField {
    Age,
    Gender,
    Location,
    Education,
    Income,
}

impl DemographicField {
    pub const ALL: [DemographicField; 5] = [
        DemographicField::Age,
        DemographicField::Gender,
        DemographicField::Location,
        DemographicField::Education,
        DemographicField::Income,
    ];

    /// Key used in model payloads and output maps.
    pub fn key(&self) -> &'static str {
        match self {
            DemographicField::Age => "age",
            DemographicField::Gender => "gender",
            DemographicField::Location => "location",
            DemographicField::Education => "education",
            DemographicField::Income => "income",
        }
    }
}

impl fmt::Display for DemographicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which demographic fields the survey collects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicsConfig {
    #[serde(default)]
    pub collect_age: bool,
    #[serde(default)]
    pub collect_gender: bool,
    #[serde(default)]
    pub collect_location: bool,
    #[serde(default)]
    pub collect_education: bool,
    #[serde(default)]
    pub collect_income: bool,
}

impl DemographicsConfig {
    pub fn all() -> Self {
        Self {
            collect_age: true,
            collect_gender: true,
            collect_location: true,
            collect_education: true,
            collect_income: true,
        }
    }

    pub fn is_enabled(&self, field: DemographicField) -> bool {
        match field {
            DemographicField::Age => self.collect_age,
            DemographicField::Gender => self.collect_gender,
            DemographicField::Location => self.collect_location,
            DemographicField::Education => self.collect_education,
            DemographicField::Income => self.collect_income,
        }
    }

    /// Enabled fields in canonical order.
    pub fn enabled_fields(&self) -> Vec<DemographicField> {
        DemographicField::ALL
            .into_iter()
            .filter(|f| self.is_enabled(*f))
            .collect()
    }
}
