//! Demographic Domains and Filter
//!
//! The enumerated value domains shown to the model (and used for persona
//! seeds), plus the allow-list filter applied to every parsed response.

use serde_json::Value;
use survey_synth_core::{DemographicField, Demographics, DemographicsConfig};
use tracing::debug;

pub const AGE_BUCKETS: &[&str] = &["18-24", "25-34", "35-44", "45-54", "55-64", "65+"];

pub const GENDERS: &[&str] = &["male", "female", "non_binary", "prefer_not_to_say"];

pub const LOCATIONS: &[&str] = &[
    "North America",
    "South America",
    "Western Europe",
    "Eastern Europe",
    "Middle East",
    "Africa",
    "South Asia",
    "East Asia",
    "Oceania",
];

pub const EDUCATION_LEVELS: &[&str] = &[
    "high_school",
    "some_college",
    "bachelors",
    "masters",
    "doctorate",
    "trade_school",
];

pub const INCOME_BRACKETS: &[&str] = &[
    "under_25k",
    "25k_50k",
    "50k_75k",
    "75k_100k",
    "100k_150k",
    "over_150k",
];

/// Allowed values for a demographic field.
pub fn domain(field: DemographicField) -> &'static [&'static str] {
    match field {
        DemographicField::Age => AGE_BUCKETS,
        DemographicField::Gender => GENDERS,
        DemographicField::Location => LOCATIONS,
        DemographicField::Education => EDUCATION_LEVELS,
        DemographicField::Income => INCOME_BRACKETS,
    }
}

/// Presence test: age only has to be non-null, the rest must be truthy.
fn is_present(field: DemographicField, value: &Value) -> bool {
    match (field, value) {
        (_, Value::Null) => false,
        (DemographicField::Age, _) => true,
        (_, Value::Bool(b)) => *b,
        (_, Value::String(s)) => !s.is_empty(),
        (_, Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        _ => true,
    }
}

/// Whether a value lies inside the prompted enumeration. Ages may also be
/// given as a plain number of years.
fn in_domain(field: DemographicField, value: &Value) -> bool {
    match value {
        Value::String(s) => domain(field).iter().any(|d| d.eq_ignore_ascii_case(s.trim())),
        Value::Number(n) if field == DemographicField::Age => n
            .as_f64()
            .map(|years| (18.0..=120.0).contains(&years))
            .unwrap_or(false),
        _ => false,
    }
}

/// Keep only enabled, present fields from a parsed demographics object.
///
/// Values are accepted as-is unless `strict` is set, in which case values
/// outside the prompted enumerations are dropped as well.
pub fn filter_demographics(
    parsed: Option<&Value>,
    config: &DemographicsConfig,
    strict: bool,
) -> Demographics {
    let mut out = Demographics::new();
    let Some(Value::Object(map)) = parsed else {
        return out;
    };

    for field in config.enabled_fields() {
        let Some(value) = map.get(field.key()) else {
            continue;
        };
        if !is_present(field, value) {
            continue;
        }
        if strict && !in_domain(field, value) {
            debug!(field = %field, value = %value, "demographics: dropped out-of-domain value");
            continue;
        }
        out.insert(field, value.clone());
    }
    out
}
