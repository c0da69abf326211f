use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

use crate::ai::generator::{BatchReport, QuestionGenerator};
use crate::allocator::allocate;
use crate::db::lecture::{NewLecture, create_lecture, store_extraction, update_status};
use crate::db::question::save_question;
use crate::error::Result;
use crate::models::{DifficultyRatio, ProcessingStatus, SlideContentRecord};
use crate::slides::SlideContentSource;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub questions_per_slide: usize,
    pub max_slides: usize,
    pub total_questions: Option<usize>,
    pub difficulty_ratio: DifficultyRatio,
    pub concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            questions_per_slide: 2,
            max_slides: 20,
            total_questions: None,
            difficulty_ratio: DifficultyRatio::default(),
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingSummary {
    pub lecture_id: i64,
    pub total_slides: usize,
    pub processed_slides: usize,
    pub saved_questions: usize,
    pub skipped_units: usize,
    pub ineligible_slides: Vec<u32>,
}

fn lock(db: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn register_upload(conn: &Connection, lecture: &NewLecture) -> Result<i64> {
    let id = create_lecture(conn, lecture)?;
    tracing::info!(lecture_id = id, title = %lecture.title, "lecture uploaded");
    Ok(id)
}

fn fail(db: &Mutex<Connection>, lecture_id: i64, message: &str) {
    tracing::error!(lecture_id, error = %message, "lecture processing failed");
    if let Err(e) = update_status(&lock(db), lecture_id, ProcessingStatus::Error, Some(message)) {
        tracing::error!(lecture_id, error = %e, "could not record error status");
    }
}

fn extract(
    db: &Mutex<Connection>,
    lecture_id: i64,
    source: &dyn SlideContentSource,
) -> Result<Vec<SlideContentRecord>> {
    let slides = source.slides(lecture_id)?;
    let json = serde_json::to_string(&slides)?;
    store_extraction(&lock(db), lecture_id, slides.len() as u32, &json)?;
    Ok(slides)
}

/// Questions are saved one by one; a failure part way leaves the earlier ones.
fn persist(db: &Mutex<Connection>, lecture_id: i64, report: &BatchReport) -> Result<usize> {
    let conn = lock(db);
    let mut saved = 0;
    for set in &report.sets {
        for question in &set.questions {
            save_question(&conn, lecture_id, set.slide_number, question)?;
            saved += 1;
        }
    }
    Ok(saved)
}

pub async fn process_lecture(
    db: &Mutex<Connection>,
    lecture_id: i64,
    source: &dyn SlideContentSource,
    generator: &QuestionGenerator,
    settings: &PipelineSettings,
) -> Result<ProcessingSummary> {
    update_status(&lock(db), lecture_id, ProcessingStatus::Processing, None)?;

    let mut slides = match extract(db, lecture_id, source) {
        Ok(slides) => slides,
        Err(e) => {
            fail(db, lecture_id, &e.to_string());
            return Err(e);
        }
    };
    let total_slides = slides.len();
    slides.truncate(settings.max_slides);
    tracing::info!(
        lecture_id,
        total_slides,
        considered = slides.len(),
        "slides extracted"
    );

    let report = match settings.total_questions {
        Some(total) => {
            allocate(
                generator,
                &slides,
                total,
                &settings.difficulty_ratio,
                settings.concurrency,
            )
            .await
        }
        None => {
            generator
                .generate_for_slides(&slides, settings.questions_per_slide)
                .await
        }
    };

    let saved = match persist(db, lecture_id, &report) {
        Ok(saved) => saved,
        Err(e) => {
            fail(db, lecture_id, &e.to_string());
            return Err(e);
        }
    };

    update_status(&lock(db), lecture_id, ProcessingStatus::Completed, None)?;
    tracing::info!(
        lecture_id,
        saved,
        skipped = report.skipped_count(),
        "lecture processing completed"
    );

    Ok(ProcessingSummary {
        lecture_id,
        total_slides,
        processed_slides: slides.len(),
        saved_questions: saved,
        skipped_units: report.skipped_count(),
        ineligible_slides: report.ineligible_slides,
    })
}

pub fn spawn_processing(
    db: Arc<Mutex<Connection>>,
    lecture_id: i64,
    source: Arc<dyn SlideContentSource>,
    generator: QuestionGenerator,
    settings: PipelineSettings,
) -> JoinHandle<Result<ProcessingSummary>> {
    tokio::spawn(async move {
        process_lecture(&db, lecture_id, source.as_ref(), &generator, &settings).await
    })
}
