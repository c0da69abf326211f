use thiserror::Error;

use crate::ai::parser::ParseError;

pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Debug, Error)]
pub enum QaError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("text completion failed: {0}")]
    Completion(String),

    #[error("could not parse model reply: {0}")]
    Parse(#[from] ParseError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    InvalidTag(#[from] TagError),
}

impl QaError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        QaError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// A persisted enum column held a tag outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} tag '{value}'")]
pub struct TagError {
    pub kind: &'static str,
    pub value: String,
}

impl TagError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
