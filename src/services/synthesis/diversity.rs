//! Diversity Enforcer
//!
//! Rebalances over-concentrated option choices within one completed batch.
//! A single in-order pass: no option may be chosen by more than
//! `ceil(batch_len / option_count)` responses, and overflow is moved to the
//! currently least-used option.

use std::collections::HashMap;

use survey_synth_core::{AnswerKind, AnswerValue, GeneratedResponse, QuestionSpec};
use tracing::debug;

/// Maximum tolerated selections per option for a batch.
pub fn fairness_threshold(batch_len: usize, option_count: usize) -> usize {
    if option_count == 0 {
        return batch_len;
    }
    batch_len.div_ceil(option_count)
}

/// Rebalance every option-bearing question across `batch` in place.
///
/// Returns the number of answers reassigned.
pub fn enforce_diversity(questions: &[QuestionSpec], batch: &mut [GeneratedResponse]) -> usize {
    let mut reassigned = 0;
    for question in questions
        .iter()
        .filter(|q| q.answer_kind() == AnswerKind::Choice)
    {
        reassigned += rebalance_question(question, batch);
    }
    if reassigned > 0 {
        debug!(
            batch_len = batch.len(),
            reassigned, "diversity: rebalanced option choices"
        );
    }
    reassigned
}

fn rebalance_question(question: &QuestionSpec, batch: &mut [GeneratedResponse]) -> usize {
    let options = question.options();
    let threshold = fairness_threshold(batch.len(), options.len());
    let mut counts: HashMap<&str, usize> = options.iter().map(|o| (o.id.as_str(), 0)).collect();
    let mut reassigned = 0;

    for response in batch.iter_mut() {
        let Some(AnswerValue::Choice(current)) = response.answer_mut(&question.id) else {
            continue;
        };

        let over = counts
            .get(current.as_str())
            .map(|c| c + 1 > threshold)
            .unwrap_or(true);
        if over {
            // Ties resolve to the earliest declared option
            let Some(target) = options
                .iter()
                .min_by_key(|o| counts.get(o.id.as_str()).copied().unwrap_or(0))
            else {
                continue;
            };
            if target.id != *current {
                *current = target.id.clone();
                reassigned += 1;
            }
        }
        if let Some(c) = counts.get_mut(current.as_str()) {
            *c += 1;
        }
    }
    reassigned
}
