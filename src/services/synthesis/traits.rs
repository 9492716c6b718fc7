//! Trait Normalizer
//!
//! Maps whatever trait payload the model produced onto the closed five-trait
//! taxonomy, then widens the spread with bounded jitter.

use rand::Rng;
use serde_json::Value;
use survey_synth_core::traits::{MAX_TRAIT_SCORE, MIN_TRAIT_SCORE};
use survey_synth_core::{TraitName, TraitScore};

/// Default jitter amplitude applied to model-derived scores.
pub const DEFAULT_TRAIT_JITTER: u8 = 8;

/// Normalize a parsed traits value into the canonical five entries.
///
/// Accepts an array of `{name, score}` objects or a `{name: score}` map.
/// Matching names are clamped into 0..=100 (unparseable scores become 0),
/// missing names default to 50, and foreign names are dropped.
pub fn normalize_traits(parsed: Option<&Value>) -> [TraitScore; 5] {
    let scored = collect_named_scores(parsed);
    TraitName::ALL.map(|name| {
        match scored.iter().find(|(n, _)| *n == name) {
            Some((_, raw)) => TraitScore::new(name, parse_score(raw)),
            None => TraitScore::neutral(name),
        }
    })
}

/// Add uniform noise in `-amplitude..=amplitude` to each score, clamped.
pub fn apply_jitter<R: Rng + ?Sized>(traits: &mut [TraitScore; 5], amplitude: u8, rng: &mut R) {
    if amplitude == 0 {
        return;
    }
    let amplitude = amplitude as i64;
    for t in traits.iter_mut() {
        let shifted = (t.score as i64 + rng.gen_range(-amplitude..=amplitude))
            .clamp(MIN_TRAIT_SCORE as i64, MAX_TRAIT_SCORE as i64);
        t.score = shifted as u8;
    }
}

/// First occurrence of each recognized trait name with its raw score.
fn collect_named_scores(parsed: Option<&Value>) -> Vec<(TraitName, &Value)> {
    let mut out: Vec<(TraitName, &Value)> = Vec::with_capacity(5);
    match parsed {
        Some(Value::Array(items)) => {
            for item in items {
                let name = item
                    .get("name")
                    .or_else(|| item.get("trait"))
                    .and_then(Value::as_str);
                if let Some(name) = name {
                    push_named(&mut out, name, item.get("score").unwrap_or(&Value::Null));
                }
            }
        }
        Some(Value::Object(map)) => {
            for (name, raw) in map {
                push_named(&mut out, name, raw);
            }
        }
        _ => {}
    }
    out
}

fn push_named<'a>(out: &mut Vec<(TraitName, &'a Value)>, name: &str, raw: &'a Value) {
    if let Ok(name) = name.parse::<TraitName>() {
        if !out.iter().any(|(n, _)| *n == name) {
            out.push((name, raw));
        }
    }
}

/// Score as an integer; anything unparseable counts as 0.
fn parse_score(raw: &Value) -> i64 {
    let as_float = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    as_float
        .filter(|f| f.is_finite())
        .map(|f| f.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
        .unwrap_or(0)
}
