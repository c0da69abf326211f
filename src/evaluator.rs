use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::question::{get_question, record_usage};
use crate::db::response::{NewResponse, correctness_for_question, save_response};
use crate::error::{QaError, Result};
use crate::models::{GeneratedQuestion, QuestionType, ResponseMetrics, StudentResponseRecord};

pub const SHORT_ANSWER_KEYWORD_SHARE: f64 = 0.5;
pub const ESSAY_KEYWORD_SHARE: f64 = 0.3;
/// Essays without keywords pass on length alone.
pub const ESSAY_MIN_LENGTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub is_correct: bool,
    pub score: f64,
}

impl Evaluation {
    fn from_correct(is_correct: bool) -> Self {
        Self {
            is_correct,
            score: if is_correct { 100.0 } else { 0.0 },
        }
    }
}

fn keyword_matches(keywords: &[String], answer: &str) -> usize {
    keywords
        .iter()
        .filter(|kw| answer.contains(&kw.to_lowercase()))
        .count()
}

pub fn evaluate(question: &GeneratedQuestion, response_text: &str) -> Evaluation {
    let student = response_text.trim().to_lowercase();
    let keywords = &question.keywords;

    let is_correct = match question.question_type {
        QuestionType::MultipleChoice | QuestionType::SingleChoice => {
            student == question.correct_answer.trim().to_lowercase()
        }
        QuestionType::ShortAnswer => {
            if keywords.is_empty() {
                let correct = question.correct_answer.trim().to_lowercase();
                correct.contains(&student) || student.contains(&correct)
            } else {
                let matches = keyword_matches(keywords, &student) as f64;
                matches >= keywords.len() as f64 * SHORT_ANSWER_KEYWORD_SHARE
            }
        }
        QuestionType::Essay => {
            if keywords.is_empty() {
                response_text.trim().chars().count() >= ESSAY_MIN_LENGTH
            } else {
                let matches = keyword_matches(keywords, &student) as f64;
                matches >= f64::max(1.0, keywords.len() as f64 * ESSAY_KEYWORD_SHARE)
            }
        }
    };

    Evaluation::from_correct(is_correct)
}

/// `round(100 * correct / known)` over responses with known correctness.
pub fn correct_rate<I>(flags: I) -> Option<i64>
where
    I: IntoIterator<Item = Option<bool>>,
{
    let (correct, known) = flags
        .into_iter()
        .flatten()
        .fold((0usize, 0usize), |(c, k), flag| (c + usize::from(flag), k + 1));

    (known > 0).then(|| (100.0 * correct as f64 / known as f64).round() as i64)
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub student_id: String,
    pub response_text: String,
    pub response_time: Option<u32>,
    pub confidence_level: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionResult {
    pub response_id: i64,
    pub is_correct: bool,
    pub score: f64,
    pub explanation: String,
    pub correct_rate: Option<i64>,
    pub metrics: ResponseMetrics,
}

/// Grade `submission`, store it, then bump the question's usage count and
/// rolling correct rate.
pub fn submit_answer(
    conn: &Connection,
    question_id: i64,
    submission: &Submission,
    submitted_at: DateTime<Utc>,
) -> Result<SubmissionResult> {
    let record =
        get_question(conn, question_id)?.ok_or_else(|| QaError::not_found("question", question_id))?;

    let evaluation = evaluate(&record.question, &submission.response_text);

    let tx = conn.unchecked_transaction()?;
    let response_id = save_response(
        &tx,
        &NewResponse {
            question_id,
            student_id: submission.student_id.clone(),
            response_text: submission.response_text.clone(),
            is_correct: Some(evaluation.is_correct),
            score: Some(evaluation.score),
            response_time: submission.response_time,
            confidence_level: submission.confidence_level,
            submitted_at,
        },
    )?;
    let rate = correct_rate(correctness_for_question(&tx, question_id)?);
    record_usage(&tx, question_id, rate)?;
    tx.commit()?;

    tracing::info!(
        question = question_id,
        student = %submission.student_id,
        correct = evaluation.is_correct,
        "student response recorded"
    );

    let stored = StudentResponseRecord {
        id: response_id,
        question_id,
        student_id: submission.student_id.clone(),
        response_text: submission.response_text.clone(),
        is_correct: Some(evaluation.is_correct),
        score: Some(evaluation.score),
        response_time: submission.response_time,
        confidence_level: submission.confidence_level,
        submitted_at,
    };

    Ok(SubmissionResult {
        response_id,
        is_correct: evaluation.is_correct,
        score: evaluation.score,
        explanation: record.question.explanation,
        correct_rate: rate,
        metrics: stored.performance_metrics(record.estimated_time),
    })
}
