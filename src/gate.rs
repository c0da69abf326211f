use crate::models::SlideContentRecord;

pub const MIN_TEXT_LENGTH: usize = 50;
pub const MIN_BULLET_POINTS: usize = 2;

/// Whether a slide carries enough material to justify generating a question.
pub fn has_sufficient_content(slide: &SlideContentRecord) -> bool {
    slide.full_text.chars().count() >= MIN_TEXT_LENGTH
        || slide.content.chars().count() >= MIN_TEXT_LENGTH
        || slide.bullet_points.len() >= MIN_BULLET_POINTS
}
