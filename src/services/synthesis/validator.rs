//! Answer Validator
//!
//! Enforces each question's answer domain and coerces anything outside it to
//! a random in-domain value. Runs on every response regardless of where the
//! answers came from.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde_json::Value;
use survey_synth_core::{Answer, AnswerKind, AnswerValue, QuestionSpec, RankEntry};
use tracing::{debug, warn};

/// Realistic stand-ins for missing or placeholder free-text answers.
pub const CANNED_RESPONSES: &[&str] = &[
    "It mostly does what I need, but setting it up took longer than I expected.",
    "I would use this more often if it fit better with the tools I already have.",
    "Honestly the price matters most to me, so I'd want to see clear value first.",
    "I like the idea, though I'd need to try it for a few weeks before deciding.",
    "The biggest thing for me is saving time on the repetitive parts of my day.",
    "I'd probably recommend it to colleagues if the support is responsive.",
    "It's fine overall, nothing that really stands out as a problem right now.",
    "Reliability is my main concern; I've been burned by tools that break often.",
];

fn placeholder_regex() -> Option<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| {
            Regex::new(
                r"(?i)^\s*(n/?a|none|null|nil|undefined|tbd|todo|-+|\.{3,}|…|\[[^\]]*\]|<[^>]*>|lorem ipsum.*|(your )?answer( goes)? here\.?)\s*$",
            )
            .ok()
        })
        .as_ref()
}

/// Whether a free-text answer is a known placeholder sentinel.
pub fn is_placeholder(text: &str) -> bool {
    text.trim().is_empty() || placeholder_regex().is_some_and(|re| re.is_match(text))
}

/// Parsed answers keyed by question id.
///
/// Accepts the `[{"questionId", "answer"}]` array the prompt asks for, and
/// also a plain `{"<questionId>": <answer>}` object.
pub fn answers_by_question(parsed: Option<&Value>) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    match parsed {
        Some(Value::Array(items)) => {
            for item in items {
                let id = ["questionId", "question_id", "id"]
                    .iter()
                    .find_map(|k| item.get(*k))
                    .and_then(scalar_to_string);
                if let Some(id) = id {
                    let answer = item
                        .get("answer")
                        .or_else(|| item.get("value"))
                        .cloned()
                        .unwrap_or(Value::Null);
                    out.entry(id).or_insert(answer);
                }
            }
        }
        Some(Value::Object(map)) => {
            for (k, v) in map {
                out.insert(k.clone(), v.clone());
            }
        }
        _ => {}
    }
    out
}

/// Outcome of validating one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub value: AnswerValue,
    pub coerced: bool,
}

/// Validate every question's answer, in the order the questions are given.
///
/// Returns the answers and the number that had to be coerced.
pub fn validate_answers<R: Rng + ?Sized>(
    questions: &[QuestionSpec],
    parsed: &HashMap<String, Value>,
    rng: &mut R,
) -> (Vec<Answer>, usize) {
    let mut coerced = 0;
    let answers = questions
        .iter()
        .map(|q| {
            let result = validate_answer(q, parsed.get(&q.id), rng);
            if result.coerced {
                coerced += 1;
            }
            Answer {
                question_id: q.id.clone(),
                value: result.value,
            }
        })
        .collect();
    (answers, coerced)
}

/// Validate a single answer against its question's domain.
pub fn validate_answer<R: Rng + ?Sized>(
    question: &QuestionSpec,
    raw: Option<&Value>,
    rng: &mut R,
) -> Validated {
    let raw = raw.unwrap_or(&Value::Null);
    let accepted = match question.answer_kind() {
        AnswerKind::Choice => match_option(question, raw).map(AnswerValue::Choice),
        AnswerKind::Numeric => parse_in_range(question, raw).map(AnswerValue::Number),
        AnswerKind::Ranking => decode_ranking(question, raw).map(AnswerValue::Ranking),
        AnswerKind::FreeText => free_text(raw).map(AnswerValue::Text),
    };

    match accepted {
        Some(value) => Validated {
            value,
            coerced: false,
        },
        None => {
            warn!(
                question_id = %question.id,
                question_type = %question.question_type,
                raw = %truncate_value(raw),
                "validator: answer outside domain, coercing"
            );
            Validated {
                value: random_answer(question, rng),
                coerced: true,
            }
        }
    }
}

/// A uniformly random in-domain answer for `question`.
pub fn random_answer<R: Rng + ?Sized>(question: &QuestionSpec, rng: &mut R) -> AnswerValue {
    match question.answer_kind() {
        AnswerKind::Choice => {
            let options = question.options();
            // answer_kind only reports Choice when options exist
            let id = options
                .choose(rng)
                .map(|o| o.id.clone())
                .unwrap_or_default();
            AnswerValue::Choice(id)
        }
        AnswerKind::Numeric => {
            let (min, max) = question.slider_bounds();
            AnswerValue::Number(rng.gen_range(min..=max))
        }
        AnswerKind::Ranking => {
            let mut ids: Vec<String> = question.options().iter().map(|o| o.id.clone()).collect();
            ids.shuffle(rng);
            AnswerValue::Ranking(
                ids.into_iter()
                    .enumerate()
                    .map(|(i, option_id)| RankEntry {
                        option_id,
                        rank: i as u32 + 1,
                    })
                    .collect(),
            )
        }
        AnswerKind::FreeText => {
            let text = CANNED_RESPONSES.choose(rng).copied().unwrap_or_default();
            AnswerValue::Text(text.to_string())
        }
    }
}

// ============================================================================
// Per-kind acceptance
// ============================================================================

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Free text from a string, number or boolean answer, unless it is a
/// placeholder.
fn free_text(raw: &Value) -> Option<String> {
    let text = match raw {
        Value::Bool(b) => b.to_string(),
        other => scalar_to_string(other)?,
    };
    (!is_placeholder(&text)).then_some(text)
}

/// Resolve an answer to a declared option id. Ids match exactly, then
/// case-insensitively; labels match case-insensitively.
fn match_option(question: &QuestionSpec, raw: &Value) -> Option<String> {
    let candidate = match raw {
        Value::Object(map) => ["optionId", "option_id", "id", "value"]
            .iter()
            .find_map(|k| map.get(*k))
            .and_then(scalar_to_string),
        other => scalar_to_string(other),
    }?;

    let options = question.options();
    if let Some(o) = options.iter().find(|o| o.id == candidate) {
        return Some(o.id.clone());
    }
    let resolved = options
        .iter()
        .find(|o| o.id.eq_ignore_ascii_case(&candidate))
        .or_else(|| {
            options
                .iter()
                .find(|o| o.label.trim().eq_ignore_ascii_case(&candidate))
        })?;
    debug!(
        question_id = %question.id,
        answer = %candidate,
        option_id = %resolved.id,
        "validator: resolved answer to option id"
    );
    Some(resolved.id.clone())
}

fn parse_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn parse_in_range(question: &QuestionSpec, raw: &Value) -> Option<i64> {
    let (min, max) = question.slider_bounds();
    parse_integer(raw).filter(|n| (min..=max).contains(n))
}

/// Decode a ranking answer into entries sorted by rank.
///
/// Accepts an array (or a JSON string holding one) of `{optionId, rank}`
/// objects or bare option ids, where list position gives the rank. Valid only
/// when every option appears exactly once with ranks exactly 1..=K.
pub fn decode_ranking(question: &QuestionSpec, raw: &Value) -> Option<Vec<RankEntry>> {
    let decoded;
    let items = match raw {
        Value::Array(items) => items,
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s).ok()?;
            decoded.as_array()?
        }
        _ => return None,
    };

    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let entry = match item {
            Value::Object(map) => {
                let option_id = ["optionId", "option_id", "id"]
                    .iter()
                    .find_map(|k| map.get(*k))
                    .and_then(scalar_to_string)?;
                let rank = map.get("rank").and_then(parse_integer)?;
                RankEntry {
                    option_id,
                    rank: u32::try_from(rank).ok()?,
                }
            }
            other => RankEntry {
                option_id: scalar_to_string(other)?,
                rank: i as u32 + 1,
            },
        };
        entries.push(entry);
    }

    let options = question.options();
    if entries.len() != options.len() {
        return None;
    }
    let ids: HashSet<&str> = entries.iter().map(|e| e.option_id.as_str()).collect();
    let ranks: HashSet<u32> = entries.iter().map(|e| e.rank).collect();
    let k = options.len() as u32;
    let complete = options.iter().all(|o| ids.contains(o.id.as_str()))
        && ids.len() == options.len()
        && (1..=k).all(|r| ranks.contains(&r));
    if !complete {
        return None;
    }

    entries.sort_by_key(|e| e.rank);
    Some(entries)
}

fn truncate_value(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 80 {
        format!("{}...", text.chars().take(80).collect::<String>())
    } else {
        text
    }
}
