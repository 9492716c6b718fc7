//! Fallback Generator
//!
//! Builds a complete, domain-valid response without touching the network.
//! Used whenever the model path fails for an ordinal.

use rand::Rng;
use survey_synth_core::{
    neutral_traits, Answer, DemographicsConfig, GeneratedResponse, QuestionSpec, ResponseSource,
};

use super::generator::respondent_window;
use super::persona::PersonaSeed;
use super::validator::random_answer;

/// Random in-domain answers for every question, in question order.
pub fn fallback_answers<R: Rng + ?Sized>(questions: &[QuestionSpec], rng: &mut R) -> Vec<Answer> {
    questions
        .iter()
        .map(|q| Answer {
            question_id: q.id.clone(),
            value: random_answer(q, rng),
        })
        .collect()
}

/// A full fallback response: random answers, neutral traits and the persona
/// seed as demographics.
pub fn fallback_response<R: Rng + ?Sized>(
    questions: &[QuestionSpec],
    demographics: &DemographicsConfig,
    persona: &PersonaSeed,
    ordinal: usize,
    rng: &mut R,
) -> GeneratedResponse {
    let answers = fallback_answers(questions, rng);
    let (started_at, completed_at) = respondent_window(questions.len(), rng);
    GeneratedResponse {
        ordinal,
        answers,
        demographics: persona.to_demographics(demographics),
        traits: neutral_traits(),
        started_at,
        completed_at,
        source: ResponseSource::Fallback,
    }
}
