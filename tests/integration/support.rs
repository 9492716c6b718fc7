//! Shared fixtures: a scripted in-memory provider and a reference survey.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use survey_synth::services::synthesis::GenerationConfig;
use survey_synth::survey_synth_core::{
    AnswerKind, DemographicsConfig, GeneratedResponse, QuestionSpec, QuestionType, TraitName,
};
use survey_synth::survey_synth_llm::{
    LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
};
use survey_synth::SynthesisEngine;

type ReplyFn = dyn Fn(usize) -> LlmResult<String> + Send + Sync;
type DelayFn = dyn Fn(usize) -> u64 + Send + Sync;

/// Install a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Provider whose reply and latency are scripted per respondent ordinal.
///
/// The ordinal is read back from the "Respondent #N" line of the prompt;
/// prompts without one (trait scoring) are treated as ordinal 0.
pub struct ScriptedProvider {
    config: ProviderConfig,
    reply: Box<ReplyFn>,
    delay_ms: Box<DelayFn>,
    calls: Mutex<Vec<usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(reply: impl Fn(usize) -> LlmResult<String> + Send + Sync + 'static) -> Self {
        Self {
            config: ProviderConfig::default(),
            reply: Box::new(reply),
            delay_ms: Box::new(|_| 0),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay_ms: impl Fn(usize) -> u64 + Send + Sync + 'static) -> Self {
        self.delay_ms = Box::new(delay_ms);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn called_ordinals(&self) -> Vec<usize> {
        let mut ordinals = self.calls.lock().unwrap().clone();
        ordinals.sort_unstable();
        ordinals
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn ordinal_from_prompt(prompt: &str) -> usize {
    prompt
        .split("Respondent #")
        .nth(1)
        .map(|rest| {
            rest.chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let ordinal = messages
            .first()
            .map(|m| ordinal_from_prompt(&m.content))
            .unwrap_or(0);
        self.calls.lock().unwrap().push(ordinal);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = (self.delay_ms)(ordinal);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        (self.reply)(ordinal).map(|text| LlmResponse::from_text(text, "scripted-model"))
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Reference survey covering every answer kind.
pub fn survey_questions() -> Vec<QuestionSpec> {
    vec![
        QuestionSpec::new("q_color", "Which color fits the brand?", QuestionType::MultipleChoice)
            .with_order(1)
            .with_options([("red", "Red"), ("green", "Green"), ("blue", "Blue")]),
        QuestionSpec::new("q_scale", "How likely are you to recommend us?", QuestionType::Slider)
            .with_order(2)
            .with_range(1, 7),
        QuestionSpec::new("q_rank", "Rank what matters most", QuestionType::Ranking)
            .with_order(3)
            .with_options([("speed", "Speed"), ("price", "Price"), ("support", "Support")]),
        QuestionSpec::new("q_text", "Anything else?", QuestionType::Text).with_order(4),
        QuestionSpec::new("q_image", "Pick a hero image", QuestionType::ImageChoice)
            .with_order(5)
            .with_options([("img1", "Mountains"), ("img2", "City")]),
    ]
}

/// A well-formed model payload for `ordinal`, tagged through the free-text
/// answer so ordering can be checked.
pub fn payload(ordinal: usize) -> String {
    serde_json::json!({
        "answers": [
            {"questionId": "q_color", "answer": "green"},
            {"questionId": "q_scale", "answer": 5},
            {"questionId": "q_rank", "answer": [
                {"optionId": "speed", "rank": 2},
                {"optionId": "price", "rank": 1},
                {"optionId": "support", "rank": 3}
            ]},
            {"questionId": "q_text", "answer": format!("I am respondent {}.", ordinal)},
            {"questionId": "q_image", "answer": "img2"}
        ],
        "demographics": {
            "age": "25-34",
            "gender": "female",
            "location": "Oceania",
            "education": "masters",
            "income": "over_150k",
            "favorite_food": "pizza"
        },
        "traits": [
            {"name": "Innovation", "category": "behavioral", "score": 70},
            {"name": "Analytical Thinking", "category": "cognitive", "score": 64},
            {"name": "Leadership", "category": "social", "score": 55},
            {"name": "Adaptability", "category": "behavioral", "score": 81},
            {"name": "Creativity", "category": "cognitive", "score": 47}
        ]
    })
    .to_string()
}

pub fn engine(provider: Arc<ScriptedProvider>, generation: GenerationConfig) -> SynthesisEngine {
    init_tracing();
    SynthesisEngine::with_provider(provider, generation).unwrap()
}

/// Assert every structural invariant of a generated response.
pub fn assert_structurally_valid(
    questions: &[QuestionSpec],
    demographics: &DemographicsConfig,
    response: &GeneratedResponse,
) {
    // Traits: canonical names, categories and order, bounded scores
    assert_eq!(response.traits.len(), 5);
    for (t, name) in response.traits.iter().zip(TraitName::ALL) {
        assert_eq!(t.name, name);
        assert_eq!(t.category, name.category());
        assert!(t.score <= 100);
    }

    // Demographics allow-list
    for key in response.demographics.keys() {
        assert!(
            demographics.is_enabled(*key),
            "demographic {} not enabled but present",
            key
        );
    }

    assert_eq!(response.answers.len(), questions.len());
    for q in questions {
        let value = response
            .answer(&q.id)
            .unwrap_or_else(|| panic!("missing answer for {}", q.id));
        match q.answer_kind() {
            AnswerKind::Choice => {
                let id = value.as_choice().expect("choice answer");
                assert!(q.has_option(id), "{} not an option of {}", id, q.id);
            }
            AnswerKind::Numeric => {
                let (min, max) = q.slider_bounds();
                let n = value.as_number().expect("numeric answer");
                assert!((min..=max).contains(&n));
            }
            AnswerKind::Ranking => {
                let entries = value.as_ranking().expect("ranking answer");
                assert_eq!(entries.len(), q.options().len());
                let mut ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
                ranks.sort_unstable();
                assert_eq!(ranks, (1..=q.options().len() as u32).collect::<Vec<_>>());
                for option in q.options() {
                    assert!(entries.iter().any(|e| e.option_id == option.id));
                }
            }
            AnswerKind::FreeText => {
                let text = value.as_text().expect("text answer");
                assert!(!text.trim().is_empty());
            }
        }
    }
}
