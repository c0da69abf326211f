use serde::Serialize;

use crate::analytics::Snapshot;
use crate::models::DifficultyTier;

pub const LOW_QUESTION_RATE: i64 = 50;
pub const WEAK_TIER_SHARE: f64 = 0.6;
pub const LOW_OVERALL_RATE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ContentReview,
    SkillImprovement,
    GeneralImprovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub action_items: Vec<&'static str>,
}

fn lecture_recommendations(snap: &Snapshot, lecture_id: i64) -> Option<Recommendation> {
    let low = snap
        .questions
        .iter()
        .filter(|q| q.lecture_id == lecture_id)
        .filter(|q| q.correct_rate.is_some_and(|rate| rate < LOW_QUESTION_RATE))
        .count();

    (low > 0).then(|| Recommendation {
        kind: RecommendationKind::ContentReview,
        priority: Priority::High,
        title: "Areas requiring content review".to_string(),
        description: format!(
            "{} questions have correct rates below {}%. It is recommended to review the content of the relevant slides.",
            low, LOW_QUESTION_RATE
        ),
        action_items: vec![
            "Review questions with low correct rates",
            "Provide detailed explanations for related slide content",
            "Provide additional examples and practice problems",
        ],
    })
}

/// Tiers where the student's known answers are below [`WEAK_TIER_SHARE`] correct.
pub fn weak_tiers(snap: &Snapshot, student_id: &str) -> Vec<DifficultyTier> {
    DifficultyTier::ALL
        .into_iter()
        .filter(|tier| {
            let (correct, known) = snap
                .responses
                .iter()
                .filter(|r| r.student_id == student_id)
                .filter(|r| {
                    snap.question(r.question_id)
                        .is_some_and(|q| q.question.difficulty == *tier)
                })
                .filter_map(|r| r.is_correct)
                .fold((0usize, 0usize), |(c, k), ok| (c + usize::from(ok), k + 1));
            known > 0 && (correct as f64 / known as f64) < WEAK_TIER_SHARE
        })
        .collect()
}

fn student_recommendations(snap: &Snapshot, student_id: &str) -> Option<Recommendation> {
    let weak = weak_tiers(snap, student_id);
    if weak.is_empty() {
        return None;
    }

    let names: Vec<&str> = weak.iter().map(|t| t.as_str()).collect();
    Some(Recommendation {
        kind: RecommendationKind::SkillImprovement,
        priority: Priority::Medium,
        title: "Difficulty levels requiring reinforcement".to_string(),
        description: format!(
            "Struggling with the following difficulty levels: {}",
            names.join(", ")
        ),
        action_items: vec![
            "Review basic concepts",
            "Practice with gradual difficulty increases",
            "Check related reference materials",
        ],
    })
}

fn general_recommendations(snap: &Snapshot) -> Option<Recommendation> {
    let average = snap.average_correct_rate()?;
    (average < LOW_OVERALL_RATE).then(|| Recommendation {
        kind: RecommendationKind::GeneralImprovement,
        priority: Priority::High,
        title: "Overall understanding improvement needed".to_string(),
        description: format!(
            "The overall average correct rate is low at {:.1}%.",
            average
        ),
        action_items: vec![
            "Strengthen basic concepts",
            "Adjust question difficulty levels",
            "Provide additional explanatory materials",
        ],
    })
}

/// Rule-based advice. General advice is only given when neither a lecture
/// nor a student is named.
pub fn recommendations(
    snap: &Snapshot,
    lecture_id: Option<i64>,
    student_id: Option<&str>,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if let Some(lecture_id) = lecture_id {
        out.extend(lecture_recommendations(snap, lecture_id));
    }
    if let Some(student_id) = student_id {
        out.extend(student_recommendations(snap, student_id));
    }
    if lecture_id.is_none() && student_id.is_none() {
        out.extend(general_recommendations(snap));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;
    use crate::models::QuestionType;

    fn sample() -> Snapshot {
        snapshot(
            vec![lecture(1, "Biology"), lecture(2, "Chemistry")],
            vec![
                question(1, 1, DifficultyTier::Easy, QuestionType::Essay, Some(41)),
                question(2, 1, DifficultyTier::Hard, QuestionType::Essay, Some(49)),
                question(3, 1, DifficultyTier::Hard, QuestionType::Essay, Some(50)),
                question(4, 2, DifficultyTier::Medium, QuestionType::Essay, Some(90)),
            ],
            vec![
                response(1, 1, "s1", Some(true), 1),
                response(2, 2, "s1", Some(false), 2),
                response(3, 3, "s1", Some(true), 3),
                response(4, 2, "s1", Some(false), 4),
                response(5, 4, "s1", None, 5),
            ],
        )
    }

    #[test]
    fn test_lecture_flags_low_questions() {
        let recs = recommendations(&sample(), Some(1), None);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::ContentReview);
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].description.starts_with("2 questions"));
        assert_eq!(recs[0].action_items.len(), 3);

        assert!(recommendations(&sample(), Some(2), None).is_empty());
    }

    #[test]
    fn test_student_weak_tiers() {
        let snap = sample();
        // hard: 1 of 3 correct; medium only has an unknown answer
        assert_eq!(weak_tiers(&snap, "s1"), vec![DifficultyTier::Hard]);

        let recs = recommendations(&snap, None, Some("s1"));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::SkillImprovement);
        assert_eq!(recs[0].priority, Priority::Medium);
        assert!(recs[0].description.ends_with("hard"));
    }

    #[test]
    fn test_general_only_without_filters() {
        let snap = sample();
        // (41 + 49 + 50 + 90) / 4 = 57.5
        let recs = recommendations(&snap, None, None);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::GeneralImprovement);
        assert!(recs[0].description.contains("57.5%"));

        let both = recommendations(&snap, Some(1), Some("s1"));
        assert!(
            both.iter()
                .all(|r| r.kind != RecommendationKind::GeneralImprovement)
        );
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn test_general_fires_for_zero_average() {
        let snap = snapshot(
            vec![lecture(1, "Biology")],
            vec![question(1, 1, DifficultyTier::Easy, QuestionType::Essay, Some(0))],
            vec![],
        );
        assert_eq!(recommendations(&snap, None, None).len(), 1);
    }

    #[test]
    fn test_no_general_advice_without_rates() {
        let snap = snapshot(
            vec![lecture(1, "Biology")],
            vec![question(1, 1, DifficultyTier::Easy, QuestionType::Essay, None)],
            vec![],
        );
        assert!(recommendations(&snap, None, None).is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let recs = recommendations(&sample(), Some(1), None);
        let json = serde_json::to_value(&recs[0]).unwrap();
        assert_eq!(json["type"], "content_review");
        assert_eq!(json["priority"], "high");
    }
}
