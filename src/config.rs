use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ai::client::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, ModelConfig};
use crate::db::get_db_path;
use crate::error::{QaError, Result};
use crate::logger::DEFAULT_LOG_FILE;
use crate::models::DifficultyRatio;
use crate::pipeline::PipelineSettings;

pub const DEFAULT_CONFIG_FILE: &str = "lecture-qa.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub questions_per_slide: usize,
    pub max_slides_for_qa: usize,
    /// When set, questions are spread over the whole deck instead of per slide.
    pub total_questions: Option<usize>,
    pub difficulty_ratio: DifficultyRatio,
    /// Generation units in flight at once; 1 is sequential.
    pub generation_concurrency: usize,
    pub db_path: Option<PathBuf>,
    pub log_path: PathBuf,
    pub enforce_choice_match: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            questions_per_slide: 2,
            max_slides_for_qa: 20,
            total_questions: None,
            difficulty_ratio: DifficultyRatio::default(),
            generation_concurrency: 1,
            db_path: None,
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            enforce_choice_match: true,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| QaError::Config(format!("{} must be a number, got '{}'", key, value)))
}

impl Config {
    /// Defaults when `path` does not exist, then environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| QaError::Config(format!("invalid config: {}", e)))
    }

    /// `QA_MODEL`, `QA_DB_PATH`, `QA_QUESTIONS_PER_SLIDE` and `QA_MAX_SLIDES`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("QA_MODEL") {
            self.model = model;
        }
        if let Some(db_path) = lookup("QA_DB_PATH") {
            self.db_path = Some(PathBuf::from(db_path));
        }
        if let Some(n) = lookup("QA_QUESTIONS_PER_SLIDE") {
            self.questions_per_slide = parse_env("QA_QUESTIONS_PER_SLIDE", &n)?;
        }
        if let Some(n) = lookup("QA_MAX_SLIDES") {
            self.max_slides_for_qa = parse_env("QA_MAX_SLIDES", &n)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.difficulty_ratio.validate()?;
        if self.generation_concurrency == 0 {
            return Err(QaError::Config(
                "generation_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(get_db_path)
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model: self.model.clone(),
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            questions_per_slide: self.questions_per_slide,
            max_slides: self.max_slides_for_qa,
            total_questions: self.total_questions,
            difficulty_ratio: self.difficulty_ratio,
            concurrency: self.generation_concurrency,
        }
    }
}
