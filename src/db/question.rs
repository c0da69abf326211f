use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};

use crate::db::{decode_list, encode_list};
use crate::error::Result;
use crate::models::{DifficultyTier, GeneratedQuestion, QuestionRecord, QuestionType};

const QUESTION_COLUMNS: &str = "id, lecture_id, slide_number, question_text, question_type, difficulty,
     correct_answer, explanation, choices, keywords, estimated_time, usage_count, correct_rate,
     created_at, updated_at";

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<QuestionRecord> {
    let explanation: Option<String> = row.get(7)?;
    Ok(QuestionRecord {
        id: row.get(0)?,
        lecture_id: row.get(1)?,
        slide_number: row.get(2)?,
        question: GeneratedQuestion {
            question: row.get(3)?,
            question_type: row.get(4)?,
            difficulty: row.get(5)?,
            correct_answer: row.get(6)?,
            explanation: explanation.unwrap_or_default(),
            choices: decode_list(8, row.get(8)?)?,
            keywords: decode_list(9, row.get(9)?)?.unwrap_or_default(),
        },
        estimated_time: row.get(10)?,
        usage_count: row.get(11)?,
        correct_rate: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

pub fn save_question(
    conn: &Connection,
    lecture_id: i64,
    slide_number: u32,
    question: &GeneratedQuestion,
) -> Result<i64> {
    let now = Utc::now();
    let choices = encode_list(question.choices.as_deref())?;
    let keywords = encode_list(Some(question.keywords.as_slice()))?;

    conn.execute(
        "INSERT INTO questions (lecture_id, slide_number, question_text, question_type, difficulty,
                                correct_answer, explanation, choices, keywords, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            lecture_id,
            slide_number,
            question.question,
            question.question_type,
            question.difficulty,
            question.correct_answer,
            question.explanation,
            choices,
            keywords,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_question(conn: &Connection, id: i64) -> Result<Option<QuestionRecord>> {
    let sql = format!("SELECT {} FROM questions WHERE id = ?1", QUESTION_COLUMNS);
    Ok(conn.query_row(&sql, [id], question_from_row).optional()?)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionFilter {
    pub lecture_id: Option<i64>,
    pub difficulty: Option<DifficultyTier>,
    pub question_type: Option<QuestionType>,
}

pub fn list_questions(conn: &Connection, filter: &QuestionFilter) -> Result<Vec<QuestionRecord>> {
    let mut clauses = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();

    if let Some(lecture_id) = &filter.lecture_id {
        clauses.push("lecture_id = ?");
        values.push(lecture_id);
    }
    if let Some(difficulty) = &filter.difficulty {
        clauses.push("difficulty = ?");
        values.push(difficulty);
    }
    if let Some(question_type) = &filter.question_type {
        clauses.push("question_type = ?");
        values.push(question_type);
    }

    let mut sql = format!("SELECT {} FROM questions", QUESTION_COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY slide_number, id");

    let mut stmt = conn.prepare(&sql)?;
    let questions = stmt
        .query_map(values.as_slice(), question_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(questions)
}

/// Administrative edit. `explanation` and `estimated_time` are only replaced when given.
#[derive(Debug, Clone, Default)]
pub struct QuestionUpdate {
    pub question_text: String,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub estimated_time: Option<u32>,
}

pub fn update_question(conn: &Connection, id: i64, update: &QuestionUpdate) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE questions
         SET question_text = ?1, correct_answer = ?2,
             explanation = COALESCE(?3, explanation),
             estimated_time = COALESCE(?4, estimated_time), updated_at = ?5
         WHERE id = ?6",
        params![
            update.question_text,
            update.correct_answer,
            update.explanation,
            update.estimated_time,
            Utc::now(),
            id
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_question(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM questions WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

/// Record one more submission and store the recomputed rolling correct rate.
pub fn record_usage(conn: &Connection, id: i64, correct_rate: Option<i64>) -> Result<()> {
    conn.execute(
        "UPDATE questions
         SET usage_count = usage_count + 1, correct_rate = COALESCE(?1, correct_rate), updated_at = ?2
         WHERE id = ?3",
        params![correct_rate, Utc::now(), id],
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_question(
    difficulty: DifficultyTier,
    question_type: QuestionType,
) -> GeneratedQuestion {
    let choices = question_type
        .is_choice()
        .then(|| vec!["Paris".to_string(), "Rome".to_string()]);
    GeneratedQuestion {
        question: "What is the capital of France?".to_string(),
        question_type,
        difficulty,
        choices,
        correct_answer: "Paris".to_string(),
        explanation: "Paris has been the capital since 987.".to_string(),
        keywords: vec!["paris".to_string()],
    }
}
