use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{QaError, TagError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 3] = [
        DifficultyTier::Easy,
        DifficultyTier::Medium,
        DifficultyTier::Hard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::Easy => "easy",
            DifficultyTier::Medium => "medium",
            DifficultyTier::Hard => "hard",
        }
    }
}

impl FromStr for DifficultyTier {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(DifficultyTier::Easy),
            "medium" => Ok(DifficultyTier::Medium),
            "hard" => Ok(DifficultyTier::Hard),
            other => Err(TagError::new("difficulty", other)),
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    SingleChoice,
    Essay,
    ShortAnswer,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::MultipleChoice,
        QuestionType::SingleChoice,
        QuestionType::Essay,
        QuestionType::ShortAnswer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::Essay => "essay",
            QuestionType::ShortAnswer => "short_answer",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::SingleChoice)
    }
}

impl FromStr for QuestionType {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "single_choice" => Ok(QuestionType::SingleChoice),
            "essay" => Ok(QuestionType::Essay),
            "short_answer" => Ok(QuestionType::ShortAnswer),
            other => Err(TagError::new("question type", other)),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Uploaded,
    Processing,
    Completed,
    Error,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Uploaded => "uploaded",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Error => "error",
        }
    }
}

impl FromStr for ProcessingStatus {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(ProcessingStatus::Uploaded),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "error" => Ok(ProcessingStatus::Error),
            other => Err(TagError::new("processing status", other)),
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContentRecord {
    pub slide_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub bullet_points: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub full_text: String,
}

impl SlideContentRecord {
    pub fn new(slide_number: u32, title: &str, content: &str, bullet_points: Vec<String>) -> Self {
        let mut record = Self {
            slide_number,
            title: title.to_string(),
            content: content.to_string(),
            bullet_points,
            images: Vec::new(),
            full_text: String::new(),
        };
        record.full_text = record.compose_full_text();
        record
    }

    /// Labelled concatenation of title, content and bullet points.
    pub fn compose_full_text(&self) -> String {
        let mut parts = Vec::new();
        if !self.title.is_empty() {
            parts.push(format!("Title: {}", self.title));
        }
        if !self.content.is_empty() {
            parts.push(format!("Content: {}", self.content));
        }
        if !self.bullet_points.is_empty() {
            parts.push("Bullet points:".to_string());
            for point in &self.bullet_points {
                parts.push(format!("• {}", point));
            }
        }
        parts.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub question_type: QuestionType,
    pub difficulty: DifficultyTier,
    pub choices: Option<Vec<String>>,
    pub correct_answer: String,
    pub explanation: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub slide_number: u32,
    pub slide_title: String,
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyDistribution {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultyDistribution {
    pub fn new(easy: usize, medium: usize, hard: usize) -> Self {
        Self { easy, medium, hard }
    }

    pub fn get(&self, tier: DifficultyTier) -> usize {
        match tier {
            DifficultyTier::Easy => self.easy,
            DifficultyTier::Medium => self.medium,
            DifficultyTier::Hard => self.hard,
        }
    }

    pub fn get_mut(&mut self, tier: DifficultyTier) -> &mut usize {
        match tier {
            DifficultyTier::Easy => &mut self.easy,
            DifficultyTier::Medium => &mut self.medium,
            DifficultyTier::Hard => &mut self.hard,
        }
    }

    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }

    pub fn tiers(&self) -> impl Iterator<Item = DifficultyTier> + '_ {
        DifficultyTier::ALL
            .into_iter()
            .flat_map(move |tier| std::iter::repeat_n(tier, self.get(tier)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRatio {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl Default for DifficultyRatio {
    fn default() -> Self {
        Self {
            easy: 0.4,
            medium: 0.4,
            hard: 0.2,
        }
    }
}

impl DifficultyRatio {
    pub fn get(&self, tier: DifficultyTier) -> f64 {
        match tier {
            DifficultyTier::Easy => self.easy,
            DifficultyTier::Medium => self.medium,
            DifficultyTier::Hard => self.hard,
        }
    }

    pub fn validate(&self) -> Result<(), QaError> {
        if DifficultyTier::ALL.iter().any(|t| self.get(*t) < 0.0) {
            return Err(QaError::Config(format!(
                "difficulty ratio parts must be non-negative: {:?}",
                self
            )));
        }
        let sum = self.easy + self.medium + self.hard;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(QaError::Config(format!(
                "difficulty ratio must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lecture {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub original_filename: String,
    pub file_size: u64,
    pub total_slides: u32,
    #[serde(skip_serializing)]
    pub extracted_content: Option<String>,
    pub is_processed: bool,
    pub processing_status: ProcessingStatus,
    pub error_message: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRecord {
    pub id: i64,
    pub lecture_id: i64,
    pub slide_number: u32,
    #[serde(flatten)]
    pub question: GeneratedQuestion,
    pub estimated_time: Option<u32>,
    pub usage_count: u32,
    pub correct_rate: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentResponseRecord {
    pub id: i64,
    pub question_id: i64,
    pub student_id: String,
    pub response_text: String,
    pub is_correct: Option<bool>,
    pub score: Option<f64>,
    pub response_time: Option<u32>,
    pub confidence_level: Option<u8>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMetrics {
    pub accuracy: f64,
    pub response_efficiency: Option<f64>,
    pub confidence_accuracy_ratio: Option<f64>,
}

impl StudentResponseRecord {
    pub fn performance_metrics(&self, estimated_time: Option<u32>) -> ResponseMetrics {
        let accuracy = if self.is_correct == Some(true) { 1.0 } else { 0.0 };

        let response_efficiency = match (estimated_time, self.response_time) {
            (Some(estimated), Some(actual)) if estimated > 0 && actual > 0 => {
                Some(estimated as f64 / actual as f64)
            }
            _ => None,
        };

        let confidence_accuracy_ratio = match (self.confidence_level, self.is_correct) {
            (Some(confidence), Some(_)) if confidence > 0 => {
                Some(accuracy / (confidence as f64 / 5.0))
            }
            _ => None,
        };

        ResponseMetrics {
            accuracy,
            response_efficiency,
            confidence_accuracy_ratio,
        }
    }
}
