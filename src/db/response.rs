use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, ToSql, params};

use crate::error::Result;
use crate::models::StudentResponseRecord;

#[derive(Debug, Clone)]
pub struct NewResponse {
    pub question_id: i64,
    pub student_id: String,
    pub response_text: String,
    pub is_correct: Option<bool>,
    pub score: Option<f64>,
    pub response_time: Option<u32>,
    pub confidence_level: Option<u8>,
    pub submitted_at: DateTime<Utc>,
}

const RESPONSE_COLUMNS: &str = "id, question_id, student_id, response_text, is_correct, score,
     response_time, confidence_level, submitted_at";

fn response_from_row(row: &Row<'_>) -> rusqlite::Result<StudentResponseRecord> {
    Ok(StudentResponseRecord {
        id: row.get(0)?,
        question_id: row.get(1)?,
        student_id: row.get(2)?,
        response_text: row.get(3)?,
        is_correct: row.get(4)?,
        score: row.get(5)?,
        response_time: row.get(6)?,
        confidence_level: row.get(7)?,
        submitted_at: row.get(8)?,
    })
}

pub fn save_response(conn: &Connection, response: &NewResponse) -> Result<i64> {
    conn.execute(
        "INSERT INTO student_responses (question_id, student_id, response_text, is_correct, score,
                                        response_time, confidence_level, submitted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            response.question_id,
            response.student_id,
            response.response_text,
            response.is_correct,
            response.score,
            response.response_time,
            response.confidence_level,
            response.submitted_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All set fields must match. `since` is inclusive, `until` exclusive.
#[derive(Debug, Clone, Default)]
pub struct ResponseFilter {
    pub question_id: Option<i64>,
    pub student_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl ResponseFilter {
    pub fn for_question(question_id: i64) -> Self {
        Self {
            question_id: Some(question_id),
            ..Self::default()
        }
    }

    pub fn for_student(student_id: &str) -> Self {
        Self {
            student_id: Some(student_id.to_string()),
            ..Self::default()
        }
    }
}

/// Matching responses, newest first.
pub fn list_responses(
    conn: &Connection,
    filter: &ResponseFilter,
) -> Result<Vec<StudentResponseRecord>> {
    let mut clauses = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();

    if let Some(question_id) = &filter.question_id {
        clauses.push("question_id = ?");
        values.push(question_id);
    }
    if let Some(student_id) = &filter.student_id {
        clauses.push("student_id = ?");
        values.push(student_id);
    }
    if let Some(since) = &filter.since {
        clauses.push("submitted_at >= ?");
        values.push(since);
    }
    if let Some(until) = &filter.until {
        clauses.push("submitted_at < ?");
        values.push(until);
    }

    let mut sql = format!("SELECT {} FROM student_responses", RESPONSE_COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY submitted_at DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let responses = stmt
        .query_map(values.as_slice(), response_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(responses)
}

/// Correctness of every response to `question_id`, unknown ones included.
pub fn correctness_for_question(conn: &Connection, question_id: i64) -> Result<Vec<Option<bool>>> {
    let mut stmt =
        conn.prepare("SELECT is_correct FROM student_responses WHERE question_id = ?1")?;
    let flags = stmt
        .query_map([question_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(flags)
}

#[cfg(test)]
pub(crate) fn sample_response(
    question_id: i64,
    student_id: &str,
    is_correct: Option<bool>,
    submitted_at: DateTime<Utc>,
) -> NewResponse {
    NewResponse {
        question_id,
        student_id: student_id.to_string(),
        response_text: "Paris".to_string(),
        is_correct,
        score: is_correct.map(|c| if c { 100.0 } else { 0.0 }),
        response_time: Some(20),
        confidence_level: Some(3),
        submitted_at,
    }
}
