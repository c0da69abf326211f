use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::ai::generator::{BatchReport, GenerationOutcome, QuestionGenerator, SkippedUnit};
use crate::difficulty::target_distribution;
use crate::gate::has_sufficient_content;
use crate::models::{
    DifficultyDistribution, DifficultyRatio, DifficultyTier, QuestionSet, SlideContentRecord,
};

/// Question count per slide: `total / n` each, plus one for the first
/// `total % n` slides.
pub fn slide_quotas(total: usize, slide_count: usize) -> Vec<usize> {
    if slide_count == 0 {
        return Vec::new();
    }
    let base = total / slide_count;
    let remainder = total % slide_count;
    (0..slide_count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPool {
    remaining: DifficultyDistribution,
}

impl TierPool {
    pub fn new(totals: DifficultyDistribution) -> Self {
        Self { remaining: totals }
    }

    pub fn remaining(&self) -> DifficultyDistribution {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.total() == 0
    }

    pub fn draw(&mut self, mut needed: usize) -> DifficultyDistribution {
        let mut drawn = DifficultyDistribution::default();

        while needed > 0 && !self.is_empty() {
            for tier in DifficultyTier::ALL {
                let available = self.remaining.get(tier);
                if available > 0 && needed > 0 {
                    let take = 1.min(available).min(needed);
                    *drawn.get_mut(tier) += take;
                    *self.remaining.get_mut(tier) -= take;
                    needed -= take;
                }
            }
        }

        drawn
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlidePlan {
    pub slide_number: u32,
    pub distribution: DifficultyDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPlan {
    pub tier_totals: DifficultyDistribution,
    pub slides: Vec<SlidePlan>,
    pub ineligible_slides: Vec<u32>,
}

impl AllocationPlan {
    pub fn planned_total(&self) -> usize {
        self.slides.iter().map(|s| s.distribution.total()).sum()
    }
}

pub fn plan_allocation(
    slides: &[SlideContentRecord],
    total_questions: usize,
    ratio: &DifficultyRatio,
) -> AllocationPlan {
    split_and_plan(slides, total_questions, ratio).1
}

/// Gate the slides once and plan over the eligible ones, which are returned
/// in the same order as `AllocationPlan::slides`.
fn split_and_plan<'a>(
    slides: &'a [SlideContentRecord],
    total_questions: usize,
    ratio: &DifficultyRatio,
) -> (Vec<&'a SlideContentRecord>, AllocationPlan) {
    let (eligible, ineligible): (Vec<_>, Vec<_>) =
        slides.iter().partition(|s| has_sufficient_content(s));

    for slide in &ineligible {
        tracing::warn!(
            slide = slide.slide_number,
            "slide skipped due to insufficient content"
        );
    }

    let tier_totals = target_distribution(total_questions, ratio);
    let mut pool = TierPool::new(tier_totals);

    let plans = eligible
        .iter()
        .zip(slide_quotas(total_questions, eligible.len()))
        .map(|(slide, quota)| SlidePlan {
            slide_number: slide.slide_number,
            distribution: pool.draw(quota),
        })
        .collect();

    let plan = AllocationPlan {
        tier_totals,
        slides: plans,
        ineligible_slides: ineligible.iter().map(|s| s.slide_number).collect(),
    };
    (eligible, plan)
}

pub async fn allocate(
    generator: &QuestionGenerator,
    slides: &[SlideContentRecord],
    total_questions: usize,
    ratio: &DifficultyRatio,
    concurrency: usize,
) -> BatchReport {
    let (eligible, plan) = split_and_plan(slides, total_questions, ratio);

    if eligible.is_empty() {
        tracing::warn!("no slides suitable for question generation");
        return BatchReport {
            ineligible_slides: plan.ineligible_slides,
            ..BatchReport::default()
        };
    }

    let units: Vec<(usize, DifficultyTier)> = plan
        .slides
        .iter()
        .enumerate()
        .flat_map(|(idx, sp)| sp.distribution.tiers().map(move |tier| (idx, tier)))
        .collect();

    tracing::info!(
        slides = eligible.len(),
        units = units.len(),
        concurrency,
        "starting batch generation"
    );

    let outcomes: Vec<(usize, DifficultyTier, GenerationOutcome)> = stream::iter(units)
        .map(|(idx, tier)| {
            let slide = eligible[idx];
            async move { (idx, tier, generator.generate_single(slide, tier).await) }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut sets: Vec<QuestionSet> = eligible
        .iter()
        .map(|slide| QuestionSet {
            slide_number: slide.slide_number,
            slide_title: slide.title.clone(),
            questions: Vec::new(),
        })
        .collect();
    let mut skipped = Vec::new();

    for (idx, tier, outcome) in outcomes {
        match outcome {
            GenerationOutcome::Success(q) => sets[idx].questions.push(q),
            GenerationOutcome::Skipped(reason) => skipped.push(SkippedUnit {
                slide_number: eligible[idx].slide_number,
                difficulty: tier,
                reason,
            }),
        }
    }

    let report = BatchReport {
        sets,
        skipped,
        ineligible_slides: plan.ineligible_slides,
    };
    tracing::info!(
        generated = report.generated_count(),
        skipped = report.skipped_count(),
        "batch generation finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::ScriptedCompletion;
    use crate::ai::generator::fixtures::{reply, rich_slide, thin_slide};
    use crate::difficulty::validate_balance;
    use std::sync::Arc;

    #[test]
    fn test_quotas_front_load_remainder() {
        let quotas = slide_quotas(10, 7);
        assert_eq!(quotas, vec![2, 2, 2, 1, 1, 1, 1]);
        assert_eq!(quotas.iter().sum::<usize>(), 10);
    }

    #[test]
    fn test_quotas_edge_cases() {
        assert!(slide_quotas(5, 0).is_empty());
        assert_eq!(slide_quotas(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(slide_quotas(0, 3), vec![0, 0, 0]);
    }

    #[test]
    fn test_pool_draws_one_per_tier_per_sweep() {
        let mut pool = TierPool::new(DifficultyDistribution::new(4, 4, 2));
        assert_eq!(pool.draw(2), DifficultyDistribution::new(1, 1, 0));
        assert_eq!(pool.draw(3), DifficultyDistribution::new(1, 1, 1));
        assert_eq!(pool.remaining(), DifficultyDistribution::new(2, 2, 1));
    }

    #[test]
    fn test_pool_never_overdraws() {
        let mut pool = TierPool::new(DifficultyDistribution::new(1, 0, 0));
        assert_eq!(pool.draw(3), DifficultyDistribution::new(1, 0, 0));
        assert!(pool.is_empty());
        assert_eq!(pool.draw(2).total(), 0);
    }

    #[test]
    fn test_plan_for_seven_slides() {
        let slides: Vec<_> = (1..=7).map(rich_slide).collect();
        let plan = plan_allocation(&slides, 10, &DifficultyRatio::default());

        let counts: Vec<usize> = plan.slides.iter().map(|s| s.distribution.total()).collect();
        assert_eq!(counts, vec![2, 2, 2, 1, 1, 1, 1]);
        assert_eq!(plan.tier_totals, DifficultyDistribution::new(4, 4, 2));
        assert_eq!(plan.planned_total(), 10);

        let mut pooled = DifficultyDistribution::default();
        for sp in &plan.slides {
            for tier in DifficultyTier::ALL {
                *pooled.get_mut(tier) += sp.distribution.get(tier);
            }
        }
        assert_eq!(pooled, plan.tier_totals);
    }

    #[test]
    fn test_plan_filters_ineligible() {
        let slides = vec![rich_slide(1), thin_slide(2), rich_slide(3)];
        let plan = plan_allocation(&slides, 4, &DifficultyRatio::default());
        assert_eq!(plan.ineligible_slides, vec![2]);
        let numbers: Vec<u32> = plan.slides.iter().map(|s| s.slide_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_no_eligible_slides_returns_empty() {
        let client = Arc::new(ScriptedCompletion::default());
        let generator = QuestionGenerator::new(client.clone());
        let slides = vec![thin_slide(1), thin_slide(2)];

        let report = allocate(&generator, &slides, 5, &DifficultyRatio::default(), 1).await;
        assert!(report.sets.is_empty());
        assert_eq!(report.ineligible_slides, vec![1, 2]);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_six_questions_three_slides() {
        // Plan: slide 1 easy+medium, slide 2 easy+medium, slide 3 hard+hard.
        let client = Arc::new(ScriptedCompletion::new(vec![
            Ok(reply("easy")),
            Ok(reply("medium")),
            Ok(reply("easy")),
            Ok(reply("medium")),
            Ok(reply("hard")),
            Ok(reply("hard")),
        ]));
        let generator = QuestionGenerator::new(client.clone());
        let slides = vec![rich_slide(1), rich_slide(2), thin_slide(3), rich_slide(4)];

        let report = allocate(&generator, &slides, 6, &DifficultyRatio::default(), 1).await;

        let numbers: Vec<u32> = report.sets.iter().map(|s| s.slide_number).collect();
        assert_eq!(numbers, vec![1, 2, 4]);
        assert_eq!(report.ineligible_slides, vec![3]);

        let balance = validate_balance(report.questions());
        assert_eq!(balance.difficulty_counts[&DifficultyTier::Easy], 2);
        assert_eq!(balance.difficulty_counts[&DifficultyTier::Medium], 2);
        assert_eq!(balance.difficulty_counts[&DifficultyTier::Hard], 2);
    }

    #[tokio::test]
    async fn test_sets_follow_plan_when_leading_slide_is_thin() {
        let client = Arc::new(ScriptedCompletion::new(vec![
            Ok(reply("easy")),
            Ok(reply("medium")),
            Ok(reply("hard")),
        ]));
        let generator = QuestionGenerator::new(client.clone());
        let slides = vec![thin_slide(1), rich_slide(2), rich_slide(3)];
        let plan = plan_allocation(&slides, 3, &DifficultyRatio::default());

        let report = allocate(&generator, &slides, 3, &DifficultyRatio::default(), 1).await;

        assert_eq!(report.ineligible_slides, vec![1]);
        assert_eq!(report.sets.len(), plan.slides.len());
        for (set, sp) in report.sets.iter().zip(&plan.slides) {
            assert_eq!(set.slide_number, sp.slide_number);
            assert_eq!(set.questions.len(), sp.distribution.total());
        }
        assert_eq!(report.sets[0].questions.len(), 2);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_skips_are_reported_and_order_kept_with_concurrency() {
        let client = Arc::new(ScriptedCompletion::new(vec![
            Ok(reply("easy")),
            Err("rate limited".to_string()),
            Ok(reply("hard")),
        ]));
        let generator = QuestionGenerator::new(client.clone());
        let slides = vec![rich_slide(1), rich_slide(2), rich_slide(3)];

        let report = allocate(&generator, &slides, 3, &DifficultyRatio::default(), 3).await;

        assert_eq!(report.sets.len(), 3);
        assert_eq!(report.generated_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        let numbers: Vec<u32> = report.sets.iter().map(|s| s.slide_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
