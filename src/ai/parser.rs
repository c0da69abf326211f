use serde::Deserialize;
use thiserror::Error;

use crate::models::{DifficultyTier, GeneratedQuestion, QuestionType};

const TAGGED_FENCE: &str = "```json";
const FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no structured payload found in reply")]
    NoStructuredPayload,

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("required field '{0}' missing")]
    MissingField(&'static str),

    #[error("field '{field}' has invalid value '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("correct answer does not match any choice")]
    ChoiceMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    TaggedFence,
    GenericFence,
    BalancedBraces,
    WholeReply,
}

/// Locate the structured payload, reporting which rung of the ladder matched.
pub fn extract_json(reply: &str) -> Option<(ExtractionStrategy, &str)> {
    if let Some(tag) = reply.find(TAGGED_FENCE) {
        let start = tag + TAGGED_FENCE.len();
        if let Some(end) = reply[start..].find(FENCE) {
            return Some((
                ExtractionStrategy::TaggedFence,
                reply[start..start + end].trim(),
            ));
        }
    }

    if let Some(open) = reply.find(FENCE) {
        let start = open + FENCE.len();
        if let Some(end) = reply[start..].find(FENCE) {
            let inner = reply[start..start + end].trim();
            if inner.starts_with('{') && inner.ends_with('}') {
                return Some((ExtractionStrategy::GenericFence, inner));
            }
        }
    }

    if let Some(span) = balanced_object(reply) {
        return Some((ExtractionStrategy::BalancedBraces, span));
    }

    let whole = reply.trim();
    if whole.starts_with('{') && whole.ends_with('}') {
        return Some((ExtractionStrategy::WholeReply, whole));
    }

    None
}

/// Span from the first `{` to the brace that closes it. Braces inside JSON
/// string literals do not count towards nesting.
fn balanced_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in reply[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&reply[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: Option<String>,
    question_type: Option<String>,
    difficulty: Option<String>,
    choices: Option<Vec<String>>,
    correct_answer: Option<String>,
    explanation: Option<String>,
    keywords: Option<Vec<String>>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ParseError> {
    value.ok_or(ParseError::MissingField(field))
}

/// Extract, decode and validate a question. When `enforce_choice_match` is
/// set, choice questions must list their correct answer among the choices.
pub fn parse_question(
    reply: &str,
    enforce_choice_match: bool,
) -> Result<GeneratedQuestion, ParseError> {
    let Some((strategy, payload)) = extract_json(reply) else {
        let preview: String = reply.chars().take(200).collect();
        tracing::error!(reply = %preview, "no JSON payload found in model reply");
        return Err(ParseError::NoStructuredPayload);
    };
    tracing::debug!(?strategy, "extracted JSON payload");

    let raw: RawQuestion =
        serde_json::from_str(payload).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let question = required(raw.question, "question")?;
    let question_type = required(raw.question_type, "question_type")?;
    let difficulty = required(raw.difficulty, "difficulty")?;
    let correct_answer = required(raw.correct_answer, "correct_answer")?;
    let explanation = required(raw.explanation, "explanation")?;

    if question.trim().is_empty() {
        return Err(ParseError::InvalidField {
            field: "question",
            value: question,
        });
    }

    let question_type: QuestionType =
        question_type
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidField {
                field: "question_type",
                value: question_type.clone(),
            })?;
    let difficulty: DifficultyTier =
        difficulty
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidField {
                field: "difficulty",
                value: difficulty.clone(),
            })?;

    let choices = if question_type.is_choice() {
        let choices = raw.choices.unwrap_or_default();
        if enforce_choice_match {
            let expected = correct_answer.trim().to_lowercase();
            if !choices
                .iter()
                .any(|c| c.trim().to_lowercase() == expected)
            {
                return Err(ParseError::ChoiceMismatch);
            }
        }
        Some(choices)
    } else {
        None
    };

    Ok(GeneratedQuestion {
        question,
        question_type,
        difficulty,
        choices,
        correct_answer,
        explanation,
        keywords: raw.keywords.unwrap_or_default(),
    })
}
