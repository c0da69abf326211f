use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytics::{QUESTION_PREVIEW_CHARS, Snapshot, count_correct};
use crate::error::{QaError, Result};
use crate::models::{DifficultyTier, QuestionRecord, QuestionType, StudentResponseRecord};
use crate::utils::{mean_1dp, percent_1dp, truncate_string};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStats {
    pub question_id: i64,
    pub slide_number: u32,
    pub question_text: String,
    pub difficulty: DifficultyTier,
    pub question_type: QuestionType,
    pub response_count: usize,
    pub correct_rate: f64,
    pub average_response_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub question_count: usize,
    pub response_count: usize,
    pub correct_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LectureStatistics {
    pub total_questions: usize,
    pub total_responses: usize,
    pub overall_correct_rate: f64,
    pub difficulty_breakdown: BTreeMap<DifficultyTier, Breakdown>,
    pub type_breakdown: BTreeMap<QuestionType, Breakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LecturePerformance {
    NoQuestions {
        lecture_id: i64,
        lecture_title: String,
        message: String,
    },
    Report {
        lecture_id: i64,
        lecture_title: String,
        overall_statistics: LectureStatistics,
        question_statistics: Vec<QuestionStats>,
    },
}

fn average_response_time<'a, I>(responses: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a StudentResponseRecord>,
{
    mean_1dp(
        responses
            .into_iter()
            .filter_map(|r| r.response_time)
            .filter(|t| *t > 0)
            .map(f64::from),
    )
}

fn breakdown<K, F>(
    questions: &[&QuestionRecord],
    by_question: &BTreeMap<i64, Vec<&StudentResponseRecord>>,
    key: F,
) -> BTreeMap<K, Breakdown>
where
    K: Ord,
    F: Fn(&QuestionRecord) -> K,
{
    let mut groups: BTreeMap<K, (usize, Vec<&StudentResponseRecord>)> = BTreeMap::new();
    for &q in questions {
        let entry = groups.entry(key(q)).or_default();
        entry.0 += 1;
        if let Some(responses) = by_question.get(&q.id) {
            entry.1.extend(responses.iter().copied());
        }
    }

    groups
        .into_iter()
        .filter(|(_, (_, responses))| !responses.is_empty())
        .map(|(k, (question_count, responses))| {
            let correct = count_correct(responses.iter().copied());
            let b = Breakdown {
                question_count,
                response_count: responses.len(),
                correct_rate: percent_1dp(correct, responses.len()),
            };
            (k, b)
        })
        .collect()
}

pub fn lecture_performance(snap: &Snapshot, lecture_id: i64) -> Result<LecturePerformance> {
    let lecture = snap
        .lecture(lecture_id)
        .ok_or_else(|| QaError::not_found("lecture", lecture_id))?;

    let questions: Vec<&QuestionRecord> = snap
        .questions
        .iter()
        .filter(|q| q.lecture_id == lecture_id)
        .collect();

    if questions.is_empty() {
        return Ok(LecturePerformance::NoQuestions {
            lecture_id,
            lecture_title: lecture.title.clone(),
            message: "No questions available for this lecture yet".to_string(),
        });
    }

    let mut by_question: BTreeMap<i64, Vec<&StudentResponseRecord>> = BTreeMap::new();
    for q in &questions {
        let responses: Vec<_> = snap.responses_to(q.id).collect();
        if !responses.is_empty() {
            by_question.insert(q.id, responses);
        }
    }

    let question_statistics = questions
        .iter()
        .filter_map(|q| {
            let responses = by_question.get(&q.id)?;
            Some(QuestionStats {
                question_id: q.id,
                slide_number: q.slide_number,
                question_text: truncate_string(&q.question.question, QUESTION_PREVIEW_CHARS),
                difficulty: q.question.difficulty,
                question_type: q.question.question_type,
                response_count: responses.len(),
                correct_rate: percent_1dp(count_correct(responses.iter().copied()), responses.len()),
                average_response_time: average_response_time(responses.iter().copied()),
            })
        })
        .collect();

    let total_responses: usize = by_question.values().map(Vec::len).sum();
    let total_correct: usize = by_question
        .values()
        .map(|rs| count_correct(rs.iter().copied()))
        .sum();

    let overall_statistics = LectureStatistics {
        total_questions: questions.len(),
        total_responses,
        overall_correct_rate: percent_1dp(total_correct, total_responses),
        difficulty_breakdown: breakdown(&questions, &by_question, |q| q.question.difficulty),
        type_breakdown: breakdown(&questions, &by_question, |q| q.question.question_type),
    };

    Ok(LecturePerformance::Report {
        lecture_id,
        lecture_title: lecture.title.clone(),
        overall_statistics,
        question_statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;

    fn sample() -> Snapshot {
        let mut long = question(3, 1, DifficultyTier::Hard, QuestionType::Essay, None);
        long.question.question = "x".repeat(150);

        let mut timed = response(3, 2, "s2", Some(true), 3);
        timed.response_time = Some(40);
        let mut timed_again = response(4, 2, "s3", Some(true), 4);
        timed_again.response_time = Some(25);

        snapshot(
            vec![lecture(1, "Biology"), lecture(2, "Empty")],
            vec![
                question(1, 1, DifficultyTier::Easy, QuestionType::MultipleChoice, None),
                question(2, 1, DifficultyTier::Easy, QuestionType::ShortAnswer, None),
                long,
                question(4, 1, DifficultyTier::Medium, QuestionType::Essay, None),
            ],
            vec![
                response(1, 1, "s1", Some(true), 1),
                response(2, 1, "s2", Some(false), 2),
                timed,
                timed_again,
                response(5, 3, "s1", Some(false), 5),
            ],
        )
    }

    fn report(perf: LecturePerformance) -> (LectureStatistics, Vec<QuestionStats>) {
        match perf {
            LecturePerformance::Report {
                overall_statistics,
                question_statistics,
                ..
            } => (overall_statistics, question_statistics),
            other => panic!("expected report, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_lecture() {
        assert!(matches!(
            lecture_performance(&sample(), 99),
            Err(QaError::NotFound { .. })
        ));
    }

    #[test]
    fn test_lecture_without_questions() {
        match lecture_performance(&sample(), 2).unwrap() {
            LecturePerformance::NoQuestions { lecture_title, .. } => {
                assert_eq!(lecture_title, "Empty")
            }
            other => panic!("expected no-questions message, got {:?}", other),
        }
    }

    #[test]
    fn test_overall_statistics() {
        let (overall, questions) = report(lecture_performance(&sample(), 1).unwrap());
        assert_eq!(overall.total_questions, 4);
        assert_eq!(overall.total_responses, 5);
        assert_eq!(overall.overall_correct_rate, 60.0);
        // question 4 has no responses
        assert_eq!(questions.len(), 3);
    }

    #[test]
    fn test_question_statistics() {
        let (_, questions) = report(lecture_performance(&sample(), 1).unwrap());
        let q1 = &questions[0];
        assert_eq!(q1.correct_rate, 50.0);
        assert_eq!(q1.average_response_time, None);

        let q2 = &questions[1];
        assert_eq!(q2.correct_rate, 100.0);
        assert_eq!(q2.average_response_time, Some(32.5));

        let q3 = &questions[2];
        assert_eq!(q3.question_text.chars().count(), 103);
        assert!(q3.question_text.ends_with("..."));
    }

    #[test]
    fn test_breakdowns_omit_groups_without_responses() {
        let (overall, _) = report(lecture_performance(&sample(), 1).unwrap());

        let easy = &overall.difficulty_breakdown[&DifficultyTier::Easy];
        assert_eq!(easy.question_count, 2);
        assert_eq!(easy.response_count, 4);
        assert_eq!(easy.correct_rate, 75.0);
        assert!(!overall.difficulty_breakdown.contains_key(&DifficultyTier::Medium));

        let essay = &overall.type_breakdown[&QuestionType::Essay];
        assert_eq!(essay.question_count, 2);
        assert_eq!(essay.response_count, 1);
        assert_eq!(essay.correct_rate, 0.0);
    }
}
