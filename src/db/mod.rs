use rusqlite::Connection;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{DifficultyTier, ProcessingStatus, QuestionType};

pub mod lecture;
pub mod question;
pub mod response;

mod embedded {
    refinery::embed_migrations!("migrations");
}

fn get_data_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| "C:\\Users\\User".to_string());
        PathBuf::from(home).join(".local\\share\\lecture-qa")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/home/user".to_string());
        PathBuf::from(home).join(".local/share/lecture-qa")
    }
}

pub fn get_db_path() -> PathBuf {
    get_data_dir().join("qa.db")
}

/// Open (creating if needed) the database at `path` and bring its schema up to date.
pub fn init_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = Connection::open(path)?;
    prepare(&mut conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    prepare(&mut conn)?;
    Ok(conn)
}

fn prepare(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    let report = embedded::migrations::runner().run(conn)?;
    for migration in report.applied_migrations() {
        tracing::info!(%migration, "applied migration");
    }
    Ok(())
}

// Enum columns hold the exact lowercase tags.
macro_rules! sql_tag {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let tag = value.as_str()?;
                tag.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

sql_tag!(DifficultyTier);
sql_tag!(QuestionType);
sql_tag!(ProcessingStatus);

/// JSON-encoded list column; NULL reads back as `None`.
pub(crate) fn encode_list(list: Option<&[String]>) -> Result<Option<String>> {
    Ok(list.map(serde_json::to_string).transpose()?)
}

pub(crate) fn decode_list(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<Vec<String>>> {
    raw.map(|s| {
        serde_json::from_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}
