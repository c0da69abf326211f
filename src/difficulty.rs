use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{DifficultyDistribution, DifficultyRatio, DifficultyTier, GeneratedQuestion};

pub const BALANCE_THRESHOLD: f64 = 0.7;

pub const IDEAL_RATIO: DifficultyRatio = DifficultyRatio {
    easy: 0.4,
    medium: 0.4,
    hard: 0.2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DifficultyProfile {
    pub cognitive_level: &'static str,
    pub question_complexity: &'static str,
    pub content_depth: &'static str,
    pub thinking_time: &'static str,
    pub vocabulary_level: &'static str,
    pub concept_integration: &'static str,
}

pub const fn profile_for(tier: DifficultyTier) -> DifficultyProfile {
    match tier {
        DifficultyTier::Easy => DifficultyProfile {
            cognitive_level: "Remember/Understand",
            question_complexity: "Simple fact check",
            content_depth: "Surface-level content",
            thinking_time: "Within 30 seconds",
            vocabulary_level: "Basic technical terms",
            concept_integration: "Single concept",
        },
        DifficultyTier::Medium => DifficultyProfile {
            cognitive_level: "Apply/Analyze",
            question_complexity: "Relating concepts",
            content_depth: "Moderate understanding",
            thinking_time: "1-2 minutes",
            vocabulary_level: "Standard technical terms",
            concept_integration: "Relation of multiple concepts",
        },
        DifficultyTier::Hard => DifficultyProfile {
            cognitive_level: "Evaluate/Create",
            question_complexity: "Critical thinking",
            content_depth: "Deep understanding and application",
            thinking_time: "Over 3 minutes",
            vocabulary_level: "Advanced technical terms",
            concept_integration: "Complex concept integration",
        },
    }
}

/// Tier-specific instruction block injected verbatim into the generation prompt.
pub fn prompt_instructions(tier: DifficultyTier) -> String {
    let p = profile_for(tier);
    match tier {
        DifficultyTier::Easy => format!(
            r#"## Difficulty: Easy
**Cognitive level**: {}
**Complexity**: {}
**Content depth**: {}
**Question features**:
- Check facts or definitions stated directly in the lecture
- Ask about the meaning of simple terms or basic concepts
- Answerable by recall or simple understanding
- Focus on {}

**Instructions**:
- Ask only about content clearly stated in the slide
- Use {}
- Make choices clearly distinguishable
- Expected answer time: {}
"#,
            p.cognitive_level,
            p.question_complexity,
            p.content_depth,
            p.concept_integration.to_lowercase(),
            p.vocabulary_level.to_lowercase(),
            p.thinking_time
        ),
        DifficultyTier::Medium => format!(
            r#"## Difficulty: Medium
**Cognitive level**: {}
**Complexity**: {}
**Content depth**: {}
**Question features**:
- Test understanding and simple application of concepts
- Require {}
- Ask for concrete examples or application situations
- Require inference or judgment

**Instructions**:
- Apply lecture concepts to realistic situations
- Use {}
- Include plausible distractors
- Expected thinking time: {}
"#,
            p.cognitive_level,
            p.question_complexity,
            p.content_depth,
            p.concept_integration.to_lowercase(),
            p.vocabulary_level.to_lowercase(),
            p.thinking_time
        ),
        DifficultyTier::Hard => format!(
            r#"## Difficulty: Hard
**Cognitive level**: {}
**Complexity**: {}
**Content depth**: {}
**Question features**:
- Require {} and critical thinking
- Combine several concepts to reach a new conclusion
- Require problem solving or creative reasoning
- Cannot be answered by memorization alone

**Instructions**:
- Analyze or evaluate an unfamiliar situation using the lecture content
- Use {}
- The reasoning process matters more than recall
- Expected thinking time: {} of careful thought
"#,
            p.cognitive_level,
            p.question_complexity,
            p.content_depth,
            p.concept_integration.to_lowercase(),
            p.vocabulary_level.to_lowercase(),
            p.thinking_time
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusGuide {
    pub focus_areas: [&'static str; 3],
    pub question_patterns: [&'static str; 3],
}

pub const fn focus_for(tier: DifficultyTier) -> FocusGuide {
    match tier {
        DifficultyTier::Easy => FocusGuide {
            focus_areas: [
                "Definition of basic terms",
                "Clearly stated facts",
                "Simple concepts",
            ],
            question_patterns: [
                "What is ...?",
                "Which is the correct definition of ...?",
                "Which statement about ... is correct?",
            ],
        },
        DifficultyTier::Medium => FocusGuide {
            focus_areas: [
                "Relationships between concepts",
                "Practical examples",
                "Comparison and contrast",
            ],
            question_patterns: [
                "Which is the correct relationship between ... and ...?",
                "How would you apply ... in practice?",
                "Which is an appropriate example of ...?",
            ],
        },
        DifficultyTier::Hard => FocusGuide {
            focus_areas: [
                "Complex concept integration",
                "Critical analysis",
                "Creative problem solving",
            ],
            question_patterns: [
                "Critically analyze ...",
                "What are the problems with ... and how could it be improved?",
                "How can ... be evaluated from another perspective?",
            ],
        },
    }
}

/// Easy and medium get `floor(total * ratio)`; hard takes whatever remains so
/// the counts always sum to `total`.
pub fn target_distribution(total: usize, ratio: &DifficultyRatio) -> DifficultyDistribution {
    let easy = (total as f64 * ratio.easy).floor() as usize;
    let medium = (total as f64 * ratio.medium).floor() as usize;
    let hard = total.saturating_sub(easy + medium);

    tracing::info!(
        total,
        easy,
        medium,
        hard,
        "computed difficulty distribution"
    );

    DifficultyDistribution { easy, medium, hard }
}

/// Heuristic closeness of an observed tier mix to the 40/40/20 ideal:
/// `max(0, 1 - 2 * mean absolute deviation)`. Not a statistical test.
pub fn balance_score(observed: &DifficultyRatio) -> f64 {
    let mean_deviation = DifficultyTier::ALL
        .iter()
        .map(|tier| (observed.get(*tier) - IDEAL_RATIO.get(*tier)).abs())
        .sum::<f64>()
        / DifficultyTier::ALL.len() as f64;

    (1.0 - mean_deviation * 2.0).max(0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    pub total_questions: usize,
    pub difficulty_counts: BTreeMap<DifficultyTier, usize>,
    pub difficulty_ratios: BTreeMap<DifficultyTier, f64>,
    pub balance_score: f64,
    pub is_balanced: bool,
}

pub fn validate_balance<'a, I>(questions: I) -> BalanceReport
where
    I: IntoIterator<Item = &'a GeneratedQuestion>,
{
    let mut counts = DifficultyDistribution::default();
    for question in questions {
        *counts.get_mut(question.difficulty) += 1;
    }

    let total = counts.total();
    let share = |tier| {
        if total > 0 {
            counts.get(tier) as f64 / total as f64
        } else {
            0.0
        }
    };
    let observed = DifficultyRatio {
        easy: share(DifficultyTier::Easy),
        medium: share(DifficultyTier::Medium),
        hard: share(DifficultyTier::Hard),
    };
    let score = balance_score(&observed);

    BalanceReport {
        total_questions: total,
        difficulty_counts: DifficultyTier::ALL
            .iter()
            .map(|t| (*t, counts.get(*t)))
            .collect(),
        difficulty_ratios: DifficultyTier::ALL
            .iter()
            .map(|t| (*t, observed.get(*t)))
            .collect(),
        balance_score: score,
        is_balanced: score >= BALANCE_THRESHOLD,
    }
}

pub fn suggest_adjustments(
    current: &DifficultyDistribution,
    target: &DifficultyDistribution,
) -> Vec<String> {
    DifficultyTier::ALL
        .iter()
        .filter_map(|tier| {
            let have = current.get(*tier);
            let want = target.get(*tier);
            if have < want {
                Some(format!("Add {} more '{}' questions", want - have, tier))
            } else if have > want {
                Some(format!("Reduce {} '{}' questions", have - want, tier))
            } else {
                None
            }
        })
        .collect()
}
