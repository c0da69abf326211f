use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{QaError, Result};
use crate::models::SlideContentRecord;

pub trait SlideContentSource: Send + Sync {
    fn slides(&self, lecture_id: i64) -> Result<Vec<SlideContentRecord>>;
}

impl SlideContentSource for Vec<SlideContentRecord> {
    fn slides(&self, _lecture_id: i64) -> Result<Vec<SlideContentRecord>> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone)]
pub struct JsonSlideSource {
    path: PathBuf,
}

impl JsonSlideSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SlideContentSource for JsonSlideSource {
    fn slides(&self, _lecture_id: i64) -> Result<Vec<SlideContentRecord>> {
        load_slides(&self.path)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SlideFile {
    Bare(Vec<SlideContentRecord>),
    Wrapped { slides: Vec<SlideContentRecord> },
}

pub fn parse_slides(json: &str) -> Result<Vec<SlideContentRecord>> {
    let file: SlideFile = serde_json::from_str(json)?;
    let mut slides = match file {
        SlideFile::Bare(slides) | SlideFile::Wrapped { slides } => slides,
    };

    for slide in &mut slides {
        if slide.full_text.trim().is_empty() {
            slide.full_text = slide.compose_full_text();
        }
    }
    slides.sort_by_key(|s| s.slide_number);
    Ok(slides)
}

/// Accepts either a bare array of slides or an object with a `slides` array.
pub fn load_slides(path: &Path) -> Result<Vec<SlideContentRecord>> {
    let content = fs::read_to_string(path).map_err(|e| {
        QaError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    parse_slides(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_bare_array() {
        let json = r#"[
            {"slide_number": 2, "title": "B", "full_text": "already there"},
            {"slide_number": 1, "title": "A", "content": "Body", "bullet_points": ["x"]}
        ]"#;
        let slides = parse_slides(json).unwrap();
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].slide_number, 1);
        assert_eq!(slides[0].full_text, "Title: A\nContent: Body\nBullet points:\n• x");
        assert_eq!(slides[1].full_text, "already there");
    }

    #[test]
    fn test_parse_wrapped_object() {
        let json = r#"{"slides": [{"slide_number": 1, "content": "Only"}]}"#;
        let slides = parse_slides(json).unwrap();
        assert_eq!(slides[0].full_text, "Content: Only");
        assert!(slides[0].images.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_slides("{\"pages\": 3}"), Err(QaError::Json(_))));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = load_slides(Path::new("/nonexistent/slides.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/slides.json"));
    }

    #[test]
    fn test_json_source_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lecture.json");
        fs::write(&path, r#"[{"slide_number": 1, "title": "Intro"}]"#).unwrap();

        let source = JsonSlideSource::new(&path);
        let slides = source.slides(1).unwrap();
        assert_eq!(slides[0].title, "Intro");
        assert_eq!(slides[0].full_text, "Title: Intro");
    }
}
