pub mod ai;
pub mod allocator;
pub mod analytics;
pub mod config;
pub mod db;
pub mod difficulty;
pub mod error;
pub mod evaluator;
pub mod gate;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod slides;
pub mod ui;
pub mod utils;

// Re-exports for convenience
pub use ai::{
    BatchReport, DEFAULT_MODEL, GenerationOutcome, ModelConfig, OpenRouterClient,
    QuestionGenerator, TextCompletion,
};
pub use allocator::{allocate, plan_allocation};
pub use analytics::Snapshot;
pub use config::Config;
pub use error::{QaError, Result};
pub use evaluator::{Evaluation, Submission, SubmissionResult, evaluate, submit_answer};
pub use gate::has_sufficient_content;
pub use models::{
    DifficultyRatio, DifficultyTier, GeneratedQuestion, Lecture, ProcessingStatus, QuestionSet,
    QuestionType, SlideContentRecord, StudentResponseRecord,
};
pub use pipeline::{PipelineSettings, ProcessingSummary, process_lecture, spawn_processing};
pub use slides::{JsonSlideSource, SlideContentSource};
