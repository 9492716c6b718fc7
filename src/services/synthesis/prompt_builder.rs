//! Prompt Builder
//!
//! Renders one generation request into a single prompt string. Building a
//! prompt cannot fail.

use survey_synth_core::{
    AnswerKind, BusinessContext, DemographicField, DemographicsConfig, QuestionSpec, TraitName,
};

use super::demographics::domain;
use super::persona::PersonaSeed;

/// Everything the prompt is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub questions: &'a [QuestionSpec],
    pub business_context: &'a BusinessContext,
    pub demographics: &'a DemographicsConfig,
    pub persona: &'a PersonaSeed,
    pub ordinal: usize,
}

/// Questions in ascending `order`; ties keep their input position.
pub fn sorted_questions(questions: &[QuestionSpec]) -> Vec<&QuestionSpec> {
    let mut sorted: Vec<&QuestionSpec> = questions.iter().collect();
    sorted.sort_by_key(|q| q.order);
    sorted
}

/// Build the full generation prompt for one respondent.
pub fn build_generation_prompt(input: &PromptInput<'_>) -> String {
    let mut parts = Vec::with_capacity(6);

    parts.push(format!(
        "You are Respondent #{} taking a product research survey. Answer every question \
         honestly and specifically, as a real person with the profile below would.",
        input.ordinal
    ));

    if let Some(ctx) = render_business_context(input.business_context) {
        parts.push(format!("\n## Product Context\n{}", ctx));
    }

    parts.push(format!(
        "\n## Your Profile (guidance)\n{}",
        render_persona(input.persona, input.demographics)
    ));

    parts.push(format!(
        "\n## Questions\n{}",
        render_questions(&sorted_questions(input.questions))
    ));

    let enabled = input.demographics.enabled_fields();
    if !enabled.is_empty() {
        parts.push(format!(
            "\n## Demographics\nReport your demographics using exactly one of the listed values per field.\n{}",
            render_demographic_domains(&enabled)
        ));
    }

    parts.push(format!("\n## Output Format\n{}", render_output_schema(&enabled)));

    parts.join("\n")
}

fn render_business_context(ctx: &BusinessContext) -> Option<String> {
    if ctx.is_empty() {
        return None;
    }

    let mut lines = Vec::new();
    let fields = [
        ("Product", &ctx.product_name),
        ("Description", &ctx.product_description),
        ("Industry", &ctx.industry),
        ("Target market", &ctx.target_market),
    ];
    for (label, value) in fields {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            lines.push(format!("- {}: {}", label, v));
        }
    }
    let pain_points: Vec<&str> = ctx
        .pain_points
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if !pain_points.is_empty() {
        lines.push(format!("- Pain points: {}", pain_points.join("; ")));
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn render_persona(persona: &PersonaSeed, config: &DemographicsConfig) -> String {
    // Seeds steer the answers even when no demographics are collected
    let mut lines: Vec<String> = DemographicField::ALL
        .iter()
        .map(|f| format!("- {}: {}", f.key(), persona.value(*f)))
        .collect();
    if !config.enabled_fields().is_empty() {
        lines.push(
            "Lean toward this profile, but keep your answers consistent with it rather than copying it verbatim."
                .to_string(),
        );
    }
    lines.join("\n")
}

fn render_questions(questions: &[&QuestionSpec]) -> String {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| render_question(i + 1, q))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_question(number: usize, q: &QuestionSpec) -> String {
    let mut out = format!("{}. [questionId: {}] {}", number, q.id, q.text.trim());

    if let Some(scenario) = q.scenario.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(&format!("\n   Scenario: {}", scenario.trim()));
    }
    if let Some(help) = q.help_text.as_deref().filter(|s| !s.trim().is_empty()) {
        out.push_str(&format!("\n   Note: {}", help.trim()));
    }

    let instruction = match q.answer_kind() {
        AnswerKind::Choice => format!(
            "Answer with exactly one option id from:\n{}",
            render_options(q)
        ),
        AnswerKind::Numeric => {
            let (min, max) = q.slider_bounds();
            let mut s = format!("Answer with a whole number from {} to {}", min, max);
            if let (Some(lo), Some(hi)) = (&q.config.min_label, &q.config.max_label) {
                s.push_str(&format!(" ({} = {}, {} = {})", min, lo, max, hi));
            }
            s.push('.');
            s
        }
        AnswerKind::Ranking => format!(
            "Rank ALL of these options, 1 = most preferred. Answer with an array of \
             {{\"optionId\": ..., \"rank\": ...}} objects using every option exactly once:\n{}",
            render_options(q)
        ),
        AnswerKind::FreeText => {
            "Answer in one to three natural sentences written in the first person.".to_string()
        }
    };
    out.push_str(&format!("\n   Type: {}. {}", q.question_type, instruction));
    out
}

fn render_options(q: &QuestionSpec) -> String {
    q.options()
        .iter()
        .map(|o| format!("   - {} ({})", o.id, o.label))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_demographic_domains(fields: &[DemographicField]) -> String {
    fields
        .iter()
        .map(|f| format!("- {}: {}", f.key(), domain(*f).join(" | ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_output_schema(fields: &[DemographicField]) -> String {
    let demographics_example = fields
        .iter()
        .map(|f| format!("\"{}\": \"{}\"", f.key(), domain(*f)[0]))
        .collect::<Vec<_>>()
        .join(", ");

    let traits_example = TraitName::ALL
        .iter()
        .map(|t| {
            format!(
                "{{\"name\": \"{}\", \"category\": \"{}\", \"score\": 72}}",
                t.display_name(),
                t.category().as_str()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n    ");

    format!(
        r#"Respond with ONLY a JSON object, no markdown and no commentary, shaped exactly like:
{{
  "answers": [{{"questionId": "<question id>", "answer": <answer>}}],
  "demographics": {{{demographics_example}}},
  "traits": [
    {traits_example}
  ]
}}
Rules:
1. Include one entry in "answers" for every question above.
2. "demographics" contains only the fields listed above.
3. "traits" has exactly 5 entries with exactly these names; each score is an integer from 0 to 100 reflecting this respondent."#
    )
}
