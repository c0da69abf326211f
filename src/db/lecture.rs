use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::Result;
use crate::models::{Lecture, ProcessingStatus};

#[derive(Debug, Clone, Default)]
pub struct NewLecture {
    pub title: String,
    pub description: Option<String>,
    pub original_filename: String,
    pub file_size: u64,
    pub author: Option<String>,
    pub subject: Option<String>,
}

const LECTURE_COLUMNS: &str = "id, title, description, original_filename, file_size, total_slides,
     extracted_content, is_processed, processing_status, error_message, author, subject,
     created_at, updated_at";

fn lecture_from_row(row: &Row<'_>) -> rusqlite::Result<Lecture> {
    Ok(Lecture {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        original_filename: row.get(3)?,
        file_size: row.get(4)?,
        total_slides: row.get(5)?,
        extracted_content: row.get(6)?,
        is_processed: row.get(7)?,
        processing_status: row.get(8)?,
        error_message: row.get(9)?,
        author: row.get(10)?,
        subject: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Insert a lecture in the `uploaded` state.
pub fn create_lecture(conn: &Connection, lecture: &NewLecture) -> Result<i64> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO lectures (title, description, original_filename, file_size, processing_status,
                               author, subject, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            lecture.title,
            lecture.description,
            lecture.original_filename,
            lecture.file_size,
            ProcessingStatus::Uploaded,
            lecture.author,
            lecture.subject,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_lecture(conn: &Connection, id: i64) -> Result<Option<Lecture>> {
    let sql = format!("SELECT {} FROM lectures WHERE id = ?1", LECTURE_COLUMNS);
    Ok(conn.query_row(&sql, [id], lecture_from_row).optional()?)
}

pub fn list_lectures(conn: &Connection) -> Result<Vec<Lecture>> {
    let sql = format!("SELECT {} FROM lectures ORDER BY id", LECTURE_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let lectures = stmt
        .query_map([], lecture_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(lectures)
}

/// Move a lecture to `status`. `is_processed` follows `completed`.
pub fn update_status(
    conn: &Connection,
    id: i64,
    status: ProcessingStatus,
    error_message: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE lectures
         SET processing_status = ?1, error_message = ?2, is_processed = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            status,
            error_message,
            status == ProcessingStatus::Completed,
            Utc::now(),
            id
        ],
    )?;
    Ok(())
}

pub fn store_extraction(
    conn: &Connection,
    id: i64,
    total_slides: u32,
    extracted_content: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE lectures SET total_slides = ?1, extracted_content = ?2, updated_at = ?3 WHERE id = ?4",
        params![total_slides, extracted_content, Utc::now(), id],
    )?;
    Ok(())
}

/// Delete a lecture together with its questions and their responses.
pub fn delete_lecture(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM lectures WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

#[cfg(test)]
pub(crate) fn sample_lecture(title: &str) -> NewLecture {
    NewLecture {
        title: title.to_string(),
        original_filename: format!("{}.pptx", title.to_lowercase().replace(' ', "_")),
        file_size: 1024,
        ..NewLecture::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn test_create_and_get_lecture() {
        let conn = open_in_memory().unwrap();
        let id = create_lecture(&conn, &sample_lecture("Cell Biology")).unwrap();

        let lecture = get_lecture(&conn, id).unwrap().unwrap();
        assert_eq!(lecture.title, "Cell Biology");
        assert_eq!(lecture.original_filename, "cell_biology.pptx");
        assert_eq!(lecture.processing_status, ProcessingStatus::Uploaded);
        assert!(!lecture.is_processed);
        assert_eq!(lecture.total_slides, 0);
    }

    #[test]
    fn test_get_nonexistent_lecture() {
        let conn = open_in_memory().unwrap();
        assert!(get_lecture(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_status_transitions() {
        let conn = open_in_memory().unwrap();
        let id = create_lecture(&conn, &sample_lecture("Genetics")).unwrap();

        update_status(&conn, id, ProcessingStatus::Processing, None).unwrap();
        store_extraction(&conn, id, 12, "[]").unwrap();
        update_status(&conn, id, ProcessingStatus::Completed, None).unwrap();

        let lecture = get_lecture(&conn, id).unwrap().unwrap();
        assert_eq!(lecture.processing_status, ProcessingStatus::Completed);
        assert!(lecture.is_processed);
        assert_eq!(lecture.total_slides, 12);
        assert_eq!(lecture.extracted_content.as_deref(), Some("[]"));
    }

    #[test]
    fn test_error_status_records_message() {
        let conn = open_in_memory().unwrap();
        let id = create_lecture(&conn, &sample_lecture("Broken")).unwrap();
        update_status(&conn, id, ProcessingStatus::Error, Some("bad file")).unwrap();

        let lecture = get_lecture(&conn, id).unwrap().unwrap();
        assert_eq!(lecture.processing_status, ProcessingStatus::Error);
        assert_eq!(lecture.error_message.as_deref(), Some("bad file"));
        assert!(!lecture.is_processed);
    }

    #[test]
    fn test_list_and_delete() {
        let conn = open_in_memory().unwrap();
        let a = create_lecture(&conn, &sample_lecture("A")).unwrap();
        let b = create_lecture(&conn, &sample_lecture("B")).unwrap();
        assert_eq!(list_lectures(&conn).unwrap().len(), 2);

        assert!(delete_lecture(&conn, a).unwrap());
        assert!(!delete_lecture(&conn, a).unwrap());
        let remaining = list_lectures(&conn).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b);
    }
}
