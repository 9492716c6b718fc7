//! Persona Seeder
//!
//! Derives a deterministic demographic seed from a response ordinal so that
//! consecutive respondents are steered toward different personas.

use serde::Serialize;
use survey_synth_core::{DemographicField, Demographics, DemographicsConfig};

use super::demographics::{AGE_BUCKETS, EDUCATION_LEVELS, GENDERS, INCOME_BRACKETS, LOCATIONS};

// Distinct offsets so fields don't cycle in lockstep
const AGE_OFFSET: usize = 0;
const GENDER_OFFSET: usize = 1;
const LOCATION_OFFSET: usize = 3;
const EDUCATION_OFFSET: usize = 2;
const INCOME_OFFSET: usize = 4;

/// Soft demographic guidance for one respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersonaSeed {
    pub age: &'static str,
    pub gender: &'static str,
    pub location: &'static str,
    pub education: &'static str,
    pub income: &'static str,
}

impl PersonaSeed {
    /// Seed for a 1-based response ordinal.
    pub fn for_ordinal(ordinal: usize) -> Self {
        let pick = |values: &'static [&'static str], offset: usize| {
            values[ordinal.wrapping_add(offset) % values.len()]
        };
        Self {
            age: pick(AGE_BUCKETS, AGE_OFFSET),
            gender: pick(GENDERS, GENDER_OFFSET),
            location: pick(LOCATIONS, LOCATION_OFFSET),
            education: pick(EDUCATION_LEVELS, EDUCATION_OFFSET),
            income: pick(INCOME_BRACKETS, INCOME_OFFSET),
        }
    }

    pub fn value(&self, field: DemographicField) -> &'static str {
        match field {
            DemographicField::Age => self.age,
            DemographicField::Gender => self.gender,
            DemographicField::Location => self.location,
            DemographicField::Education => self.education,
            DemographicField::Income => self.income,
        }
    }

    /// The seed as a demographics map restricted to the enabled fields.
    pub fn to_demographics(&self, config: &DemographicsConfig) -> Demographics {
        config
            .enabled_fields()
            .into_iter()
            .map(|f| (f, serde_json::Value::String(self.value(f).to_string())))
            .collect()
    }
}
