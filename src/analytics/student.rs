use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytics::{QUESTION_PREVIEW_CHARS, Snapshot, count_correct};
use crate::models::{DifficultyTier, QuestionRecord, QuestionType, StudentResponseRecord};
use crate::utils::{mean_1dp, percent_1dp, truncate_string};

pub const RECENT_ACTIVITY_LIMIT: usize = 10;
pub const MIN_TREND_RESPONSES: usize = 5;
pub const TREND_WINDOW: usize = 20;
pub const TREND_CHUNK: usize = 5;
pub const MIN_CHUNK: usize = 3;
pub const TREND_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LearningTrends {
    Insufficient {
        message: String,
    },
    Analysis {
        performance_trend: Trend,
        recent_correct_rates: Vec<f64>,
        average_response_time: Option<f64>,
    },
}

pub fn learning_trends(responses: &[&StudentResponseRecord]) -> LearningTrends {
    if responses.len() < MIN_TREND_RESPONSES {
        return LearningTrends::Insufficient {
            message: "Insufficient data for trend analysis".to_string(),
        };
    }

    let mut window: Vec<&StudentResponseRecord> =
        responses.iter().take(TREND_WINDOW).copied().collect();
    window.sort_by_key(|r| r.submitted_at);

    let rates: Vec<f64> = window
        .chunks(TREND_CHUNK)
        .filter(|chunk| chunk.len() >= MIN_CHUNK)
        .map(|chunk| 100.0 * count_correct(chunk.iter().copied()) as f64 / chunk.len() as f64)
        .collect();

    let trend = match (rates.first(), rates.last()) {
        (Some(first), Some(last)) if rates.len() >= 2 => {
            if *last > first + TREND_THRESHOLD {
                Trend::Improving
            } else if *last < first - TREND_THRESHOLD {
                Trend::Declining
            } else {
                Trend::Stable
            }
        }
        _ => Trend::Stable,
    };

    LearningTrends::Analysis {
        performance_trend: trend,
        recent_correct_rates: rates,
        average_response_time: mean_1dp(
            responses
                .iter()
                .filter_map(|r| r.response_time)
                .filter(|t| *t > 0)
                .map(f64::from),
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub total_attempts: usize,
    pub correct_count: usize,
    pub correct_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentOverview {
    pub total_responses: usize,
    pub correct_responses: usize,
    pub overall_correct_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentActivity {
    pub submitted_at: DateTime<Utc>,
    pub lecture_title: String,
    pub question_text: String,
    pub difficulty: DifficultyTier,
    pub is_correct: Option<bool>,
    pub response_time: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StudentProgress {
    NoResponses {
        student_id: String,
        message: String,
    },
    Report {
        student_id: String,
        overall_statistics: StudentOverview,
        difficulty_performance: BTreeMap<DifficultyTier, Performance>,
        type_performance: BTreeMap<QuestionType, Performance>,
        recent_activity: Vec<RecentActivity>,
        learning_trends: LearningTrends,
    },
}

fn performance_by<K, F>(
    answered: &[(&StudentResponseRecord, &QuestionRecord)],
    key: F,
) -> BTreeMap<K, Performance>
where
    K: Ord,
    F: Fn(&QuestionRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<&StudentResponseRecord>> = BTreeMap::new();
    for &(r, q) in answered {
        groups.entry(key(q)).or_default().push(r);
    }

    groups
        .into_iter()
        .map(|(k, responses)| {
            let correct = count_correct(responses.iter().copied());
            let p = Performance {
                total_attempts: responses.len(),
                correct_count: correct,
                correct_rate: percent_1dp(correct, responses.len()),
            };
            (k, p)
        })
        .collect()
}

pub fn student_progress(snap: &Snapshot, student_id: &str) -> StudentProgress {
    let responses: Vec<&StudentResponseRecord> = snap
        .responses
        .iter()
        .filter(|r| r.student_id == student_id)
        .collect();

    if responses.is_empty() {
        return StudentProgress::NoResponses {
            student_id: student_id.to_string(),
            message: "No response records for this student".to_string(),
        };
    }

    let correct = count_correct(responses.iter().copied());

    // Responses to deleted questions drop out of the breakdowns.
    let answered: Vec<(&StudentResponseRecord, &QuestionRecord)> = responses
        .iter()
        .filter_map(|r| snap.question(r.question_id).map(|q| (*r, q)))
        .collect();

    // Window first; responses to deleted questions then drop out of it.
    let recent_activity = responses
        .iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .filter_map(|r| snap.question(r.question_id).map(|q| (r, q)))
        .map(|(r, q)| RecentActivity {
            submitted_at: r.submitted_at,
            lecture_title: snap
                .lecture(q.lecture_id)
                .map(|l| l.title.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            question_text: truncate_string(&q.question.question, QUESTION_PREVIEW_CHARS),
            difficulty: q.question.difficulty,
            is_correct: r.is_correct,
            response_time: r.response_time,
        })
        .collect();

    StudentProgress::Report {
        student_id: student_id.to_string(),
        overall_statistics: StudentOverview {
            total_responses: responses.len(),
            correct_responses: correct,
            overall_correct_rate: percent_1dp(correct, responses.len()),
        },
        difficulty_performance: performance_by(&answered, |q| q.question.difficulty),
        type_performance: performance_by(&answered, |q| q.question.question_type),
        recent_activity,
        learning_trends: learning_trends(&responses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;

    /// Chronological responses with the given correctness, returned newest first.
    fn history(pattern: &[bool]) -> Vec<StudentResponseRecord> {
        let mut records: Vec<_> = pattern
            .iter()
            .enumerate()
            .map(|(i, c)| response(i as i64 + 1, 1, "s1", Some(*c), i as i64))
            .collect();
        records.reverse();
        records
    }

    fn trend_of(pattern: &[bool]) -> LearningTrends {
        let records = history(pattern);
        let refs: Vec<&StudentResponseRecord> = records.iter().collect();
        learning_trends(&refs)
    }

    fn group(correct: usize) -> Vec<bool> {
        (0..5).map(|i| i < correct).collect()
    }

    #[test]
    fn test_improving() {
        let pattern = [group(2), group(3), group(3), group(4)].concat();
        match trend_of(&pattern) {
            LearningTrends::Analysis {
                performance_trend,
                recent_correct_rates,
                ..
            } => {
                assert_eq!(performance_trend, Trend::Improving);
                assert_eq!(recent_correct_rates, vec![40.0, 60.0, 60.0, 80.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_declining() {
        let pattern = [group(4), group(3), group(3), group(2)].concat();
        assert!(matches!(
            trend_of(&pattern),
            LearningTrends::Analysis {
                performance_trend: Trend::Declining,
                ..
            }
        ));
    }

    #[test]
    fn test_ten_point_change_is_stable() {
        // 60, 60, then a trailing chunk of four at 50
        let mut pattern = [group(3), group(3)].concat();
        pattern.extend([true, true, false, false]);
        match trend_of(&pattern) {
            LearningTrends::Analysis {
                performance_trend,
                recent_correct_rates,
                ..
            } => {
                assert_eq!(recent_correct_rates, vec![60.0, 60.0, 50.0]);
                assert_eq!(performance_trend, Trend::Stable);
            }
            other => panic!("unexpected {:?}", other),
        }

        // 40, 40, then 50
        let mut pattern = [group(2), group(2)].concat();
        pattern.extend([true, true, false, false]);
        assert!(matches!(
            trend_of(&pattern),
            LearningTrends::Analysis {
                performance_trend: Trend::Stable,
                ..
            }
        ));
    }

    #[test]
    fn test_short_trailing_chunk_dropped() {
        let mut pattern = group(5);
        pattern.extend([false, false]);
        match trend_of(&pattern) {
            LearningTrends::Analysis {
                performance_trend,
                recent_correct_rates,
                ..
            } => {
                assert_eq!(recent_correct_rates, vec![100.0]);
                assert_eq!(performance_trend, Trend::Stable);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_only_recent_twenty_considered() {
        // 5 old wrong answers followed by 20 right ones
        let pattern = [group(0), group(5), group(5), group(5), group(5)].concat();
        match trend_of(&pattern) {
            LearningTrends::Analysis {
                recent_correct_rates,
                performance_trend,
                ..
            } => {
                assert_eq!(recent_correct_rates.len(), 4);
                assert_eq!(performance_trend, Trend::Stable);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_insufficient_data() {
        let trends = trend_of(&[true, true, false, true]);
        assert!(matches!(trends, LearningTrends::Insufficient { .. }));
        let json = serde_json::to_value(&trends).unwrap();
        assert_eq!(json["message"], "Insufficient data for trend analysis");
    }

    #[test]
    fn test_average_response_time() {
        let mut records = history(&group(3));
        records[0].response_time = Some(10);
        records[1].response_time = Some(25);
        records[2].response_time = Some(0);
        let refs: Vec<&StudentResponseRecord> = records.iter().collect();
        match learning_trends(&refs) {
            LearningTrends::Analysis {
                average_response_time,
                ..
            } => assert_eq!(average_response_time, Some(17.5)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_student_progress_report() {
        let snap = snapshot(
            vec![lecture(1, "Biology")],
            vec![
                question(1, 1, DifficultyTier::Easy, QuestionType::SingleChoice, None),
                question(2, 1, DifficultyTier::Hard, QuestionType::Essay, None),
                question(3, 7, DifficultyTier::Hard, QuestionType::Essay, None),
            ],
            vec![
                response(1, 1, "s1", Some(true), 1),
                response(2, 2, "s1", Some(false), 2),
                response(3, 2, "s1", Some(true), 3),
                response(4, 3, "s1", Some(false), 4),
                response(5, 1, "other", Some(false), 5),
            ],
        );

        match student_progress(&snap, "s1") {
            StudentProgress::Report {
                overall_statistics,
                difficulty_performance,
                type_performance,
                recent_activity,
                learning_trends,
                ..
            } => {
                assert_eq!(overall_statistics.total_responses, 4);
                assert_eq!(overall_statistics.correct_responses, 2);
                assert_eq!(overall_statistics.overall_correct_rate, 50.0);

                let hard = &difficulty_performance[&DifficultyTier::Hard];
                assert_eq!(hard.total_attempts, 3);
                assert_eq!(hard.correct_count, 1);
                assert_eq!(hard.correct_rate, 33.3);
                assert_eq!(type_performance[&QuestionType::SingleChoice].correct_rate, 100.0);

                assert_eq!(recent_activity.len(), 4);
                assert_eq!(recent_activity[0].lecture_title, "Unknown");
                assert_eq!(recent_activity[1].lecture_title, "Biology");
                assert!(recent_activity[0].submitted_at > recent_activity[1].submitted_at);

                assert!(matches!(learning_trends, LearningTrends::Insufficient { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_recent_activity_capped() {
        let responses: Vec<_> = (0..15)
            .map(|i| response(i + 1, 1, "s1", Some(true), i))
            .collect();
        let snap = snapshot(
            vec![lecture(1, "Biology")],
            vec![question(1, 1, DifficultyTier::Easy, QuestionType::Essay, None)],
            responses,
        );
        match student_progress(&snap, "s1") {
            StudentProgress::Report {
                recent_activity, ..
            } => assert_eq!(recent_activity.len(), RECENT_ACTIVITY_LIMIT),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_recent_activity_window_includes_deleted_questions() {
        // The three newest responses belong to a question that no longer exists.
        let responses: Vec<_> = (0..12)
            .map(|i| {
                let question_id = if i >= 9 { 99 } else { 1 };
                response(i + 1, question_id, "s1", Some(true), i)
            })
            .collect();
        let snap = snapshot(
            vec![lecture(1, "Biology")],
            vec![question(1, 1, DifficultyTier::Easy, QuestionType::Essay, None)],
            responses,
        );
        match student_progress(&snap, "s1") {
            StudentProgress::Report {
                recent_activity,
                overall_statistics,
                ..
            } => {
                assert_eq!(overall_statistics.total_responses, 12);
                assert_eq!(recent_activity.len(), RECENT_ACTIVITY_LIMIT - 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_student_without_responses() {
        let progress = student_progress(&Snapshot::default(), "ghost");
        assert!(matches!(progress, StudentProgress::NoResponses { .. }));
    }
}
