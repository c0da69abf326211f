pub mod client;
pub mod generator;
pub mod parser;
pub mod prompt;

pub use client::{ChatMessage, DEFAULT_MODEL, ModelConfig, OpenRouterClient, TextCompletion};
pub use generator::{BatchReport, GenerationOutcome, QuestionGenerator, SkipReason};
pub use parser::{ParseError, parse_question};
