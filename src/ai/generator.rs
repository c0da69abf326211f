use serde::Serialize;
use std::sync::Arc;

use crate::ai::client::TextCompletion;
use crate::ai::parser::{ParseError, parse_question};
use crate::ai::prompt::build_question_prompt;
use crate::gate::has_sufficient_content;
use crate::models::{
    DifficultyDistribution, DifficultyTier, GeneratedQuestion, QuestionSet, SlideContentRecord,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Completion(String),
    Parse(String),
}

impl From<ParseError> for SkipReason {
    fn from(e: ParseError) -> Self {
        SkipReason::Parse(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success(GeneratedQuestion),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedUnit {
    pub slide_number: u32,
    pub difficulty: DifficultyTier,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub sets: Vec<QuestionSet>,
    pub skipped: Vec<SkippedUnit>,
    pub ineligible_slides: Vec<u32>,
}

impl BatchReport {
    pub fn generated_count(&self) -> usize {
        self.sets.iter().map(|s| s.questions.len()).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn questions(&self) -> impl Iterator<Item = &GeneratedQuestion> {
        self.sets.iter().flat_map(|s| s.questions.iter())
    }
}

/// Per-slide tier counts for `n` questions, cycling easy, medium, hard.
pub fn per_slide_distribution(n: usize) -> DifficultyDistribution {
    let mut dist = DifficultyDistribution::default();
    for tier in DifficultyTier::ALL.iter().cycle().take(n) {
        *dist.get_mut(*tier) += 1;
    }
    dist
}

#[derive(Clone)]
pub struct QuestionGenerator {
    client: Arc<dyn TextCompletion>,
    enforce_choice_match: bool,
}

impl QuestionGenerator {
    pub fn new(client: Arc<dyn TextCompletion>) -> Self {
        Self {
            client,
            enforce_choice_match: true,
        }
    }

    pub fn with_choice_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_choice_match = enforce;
        self
    }

    /// BUILD_PROMPT -> INVOKE_LLM -> PARSE_RESPONSE -> VALIDATE for one question.
    pub async fn generate_single(
        &self,
        slide: &SlideContentRecord,
        tier: DifficultyTier,
    ) -> GenerationOutcome {
        let prompt = build_question_prompt(slide, tier);

        let reply = match self.client.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    slide = slide.slide_number,
                    %tier,
                    error = %e,
                    "question generation failed"
                );
                return GenerationOutcome::Skipped(SkipReason::Completion(e.to_string()));
            }
        };
        tracing::debug!(slide = slide.slide_number, %tier, reply = %reply, "raw model reply");

        match parse_question(&reply, self.enforce_choice_match) {
            Ok(question) => {
                if question.difficulty != tier {
                    tracing::warn!(
                        slide = slide.slide_number,
                        requested = %tier,
                        returned = %question.difficulty,
                        "model returned a different difficulty than requested"
                    );
                }
                GenerationOutcome::Success(question)
            }
            Err(e) => {
                tracing::error!(
                    slide = slide.slide_number,
                    %tier,
                    error = %e,
                    "unusable model reply"
                );
                GenerationOutcome::Skipped(e.into())
            }
        }
    }

    pub async fn generate_for_slide(
        &self,
        slide: &SlideContentRecord,
        distribution: &DifficultyDistribution,
    ) -> (QuestionSet, Vec<SkippedUnit>) {
        let mut questions = Vec::new();
        let mut skipped = Vec::new();

        for tier in distribution.tiers() {
            match self.generate_single(slide, tier).await {
                GenerationOutcome::Success(q) => questions.push(q),
                GenerationOutcome::Skipped(reason) => skipped.push(SkippedUnit {
                    slide_number: slide.slide_number,
                    difficulty: tier,
                    reason,
                }),
            }
        }

        let set = QuestionSet {
            slide_number: slide.slide_number,
            slide_title: slide.title.clone(),
            questions,
        };
        (set, skipped)
    }

    /// Per-slide mode: every eligible slide gets the same tier mix.
    pub async fn generate_for_slides(
        &self,
        slides: &[SlideContentRecord],
        questions_per_slide: usize,
    ) -> BatchReport {
        let distribution = per_slide_distribution(questions_per_slide);
        let mut report = BatchReport::default();

        for slide in slides {
            if !has_sufficient_content(slide) {
                tracing::warn!(
                    slide = slide.slide_number,
                    "slide skipped due to insufficient content"
                );
                report.ineligible_slides.push(slide.slide_number);
                continue;
            }

            let (set, skipped) = self.generate_for_slide(slide, &distribution).await;
            tracing::info!(
                slide = slide.slide_number,
                generated = set.questions.len(),
                "questions generated for slide"
            );
            report.sets.push(set);
            report.skipped.extend(skipped);
        }

        report
    }
}
