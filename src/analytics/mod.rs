use rusqlite::Connection;

use crate::db::lecture::list_lectures;
use crate::db::question::{QuestionFilter, list_questions};
use crate::db::response::{ResponseFilter, list_responses};
use crate::error::Result;
use crate::models::{Lecture, QuestionRecord, StudentResponseRecord};

pub mod dashboard;
pub mod lecture;
pub mod recommendations;
pub mod student;

pub use dashboard::{Dashboard, QuestionOverview, dashboard, question_overview};
pub use lecture::{LecturePerformance, lecture_performance};
pub use recommendations::{Recommendation, recommendations};
pub use student::{LearningTrends, StudentProgress, Trend, student_progress};

pub const QUESTION_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub lectures: Vec<Lecture>,
    pub questions: Vec<QuestionRecord>,
    pub responses: Vec<StudentResponseRecord>,
}

impl Snapshot {
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Self {
            lectures: list_lectures(conn)?,
            questions: list_questions(conn, &QuestionFilter::default())?,
            responses: list_responses(conn, &ResponseFilter::default())?,
        })
    }

    pub fn lecture(&self, id: i64) -> Option<&Lecture> {
        self.lectures.iter().find(|l| l.id == id)
    }

    pub fn question(&self, id: i64) -> Option<&QuestionRecord> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn responses_to(&self, question_id: i64) -> impl Iterator<Item = &StudentResponseRecord> {
        self.responses
            .iter()
            .filter(move |r| r.question_id == question_id)
    }

    pub fn average_correct_rate(&self) -> Option<f64> {
        average_known_rate(self.questions.iter())
    }
}

pub(crate) fn average_known_rate<'a, I>(questions: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a QuestionRecord>,
{
    let (sum, count) = questions
        .into_iter()
        .filter_map(|q| q.correct_rate)
        .fold((0i64, 0usize), |(s, c), rate| (s + rate, c + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

pub(crate) fn count_correct<'a, I>(responses: I) -> usize
where
    I: IntoIterator<Item = &'a StudentResponseRecord>,
{
    responses
        .into_iter()
        .filter(|r| r.is_correct == Some(true))
        .count()
}
