use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytics::{Snapshot, average_known_rate};
use crate::models::{DifficultyTier, QuestionRecord, QuestionType};
use crate::utils::round_1dp;

pub const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_lectures: usize,
    pub total_questions: usize,
    pub total_responses: usize,
    pub average_correct_rate: f64,
    pub recent_responses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateGroup {
    pub question_count: usize,
    pub average_correct_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub overview: Overview,
    pub difficulty_analysis: BTreeMap<DifficultyTier, RateGroup>,
    pub type_analysis: BTreeMap<QuestionType, RateGroup>,
}

fn group_rates<K, F>(questions: &[QuestionRecord], key: F) -> BTreeMap<K, RateGroup>
where
    K: Ord,
    F: Fn(&QuestionRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<&QuestionRecord>> = BTreeMap::new();
    for q in questions.iter().filter(|q| q.correct_rate.is_some()) {
        groups.entry(key(q)).or_default().push(q);
    }

    groups
        .into_iter()
        .map(|(k, qs)| {
            let group = RateGroup {
                question_count: qs.len(),
                average_correct_rate: average_known_rate(qs).map(round_1dp).unwrap_or(0.0),
            };
            (k, group)
        })
        .collect()
}

pub fn dashboard(snap: &Snapshot, now: DateTime<Utc>) -> Dashboard {
    let week_ago = now - Duration::days(RECENT_WINDOW_DAYS);

    let overview = Overview {
        total_lectures: snap.lectures.len(),
        total_questions: snap.questions.len(),
        total_responses: snap.responses.len(),
        average_correct_rate: snap.average_correct_rate().map(round_1dp).unwrap_or(0.0),
        recent_responses: snap
            .responses
            .iter()
            .filter(|r| r.submitted_at >= week_ago)
            .count(),
    };

    Dashboard {
        overview,
        difficulty_analysis: group_rates(&snap.questions, |q| q.question.difficulty),
        type_analysis: group_rates(&snap.questions, |q| q.question.question_type),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOverview {
    pub total_questions: usize,
    pub total_responses: usize,
    pub average_correct_rate: f64,
    pub difficulty_distribution: BTreeMap<DifficultyTier, usize>,
    pub type_distribution: BTreeMap<QuestionType, usize>,
}

pub fn question_overview(snap: &Snapshot) -> QuestionOverview {
    let mut difficulty_distribution = BTreeMap::new();
    let mut type_distribution = BTreeMap::new();
    for q in &snap.questions {
        *difficulty_distribution.entry(q.question.difficulty).or_insert(0) += 1;
        *type_distribution.entry(q.question.question_type).or_insert(0) += 1;
    }

    QuestionOverview {
        total_questions: snap.questions.len(),
        total_responses: snap.responses.len(),
        average_correct_rate: snap.average_correct_rate().map(round_1dp).unwrap_or(0.0),
        difficulty_distribution,
        type_distribution,
    }
}
