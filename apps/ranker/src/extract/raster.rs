//! Raster image extraction through an injected OCR engine.
//!
//! The engine reports recognized lines with their bounding boxes; lines are then grouped
//! into paragraphs so the output matches paragraph-level OCR rather than one line per row.
//! Grouping looks at both axes, so side-by-side columns stay separate.

use std::path::Path;

use tracing::debug;

use super::ExtractError;

/// A single recognized line of text with its bounding box in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl OcrLine {
    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    fn overlaps_horizontally(&self, other: &OcrLine) -> bool {
        self.left < other.right && other.left < self.right
    }

    /// True when `next` reads as the continuation of `self`: directly below it, within half a
    /// line height, and sharing some horizontal extent.
    fn continued_by(&self, next: &OcrLine) -> bool {
        next.top >= self.top
            && next.top - self.bottom <= self.height() * 0.5
            && self.overlaps_horizontally(next)
    }
}

/// Recognizes text lines in an image file, in the engine's reading order.
///
/// Constructed once at startup and shared; implementations must be safe to call from
/// several threads (serialize internally if the backend is not).
pub trait OcrEngine: Send + Sync {
    fn recognize_lines(&self, path: &Path) -> Result<Vec<OcrLine>, ExtractError>;
}

pub fn extract_image_text(engine: &dyn OcrEngine, path: &Path) -> Result<String, ExtractError> {
    debug!("Running OCR on {:?}", path);

    let lines = engine.recognize_lines(path)?;
    Ok(group_paragraphs(lines).join("\n"))
}

/// Merges lines into paragraphs, keeping the engine's order.
///
/// Each line joins the most recent paragraph whose last line it continues (see
/// [`OcrLine::continued_by`]); otherwise it opens a new paragraph. Paragraphs are returned in
/// the order they were opened.
pub fn group_paragraphs(lines: Vec<OcrLine>) -> Vec<String> {
    let mut paragraphs: Vec<(String, OcrLine)> = Vec::new();

    for line in lines.into_iter().filter(|l| !l.text.trim().is_empty()) {
        let text = line.text.trim().to_string();
        match paragraphs.iter_mut().rev().find(|(_, last)| last.continued_by(&line)) {
            Some((current, last)) => {
                current.push(' ');
                current.push_str(&text);
                *last = line;
            }
            None => paragraphs.push((text, line)),
        }
    }

    paragraphs.into_iter().map(|(text, _)| text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, top: f32, bottom: f32) -> OcrLine {
        placed(text, 0.0, 200.0, top, bottom)
    }

    fn placed(text: &str, left: f32, right: f32, top: f32, bottom: f32) -> OcrLine {
        OcrLine {
            text: text.to_string(),
            left,
            right,
            top,
            bottom,
        }
    }

    struct FixedOcr(Vec<OcrLine>);

    impl OcrEngine for FixedOcr {
        fn recognize_lines(&self, _path: &Path) -> Result<Vec<OcrLine>, ExtractError> {
            Ok(self.0.clone())
        }
    }

    struct FailingOcr;

    impl OcrEngine for FailingOcr {
        fn recognize_lines(&self, _path: &Path) -> Result<Vec<OcrLine>, ExtractError> {
            Err(ExtractError::Ocr("decoder exploded".to_string()))
        }
    }

    #[test]
    fn test_close_lines_merge_into_one_paragraph() {
        let lines = vec![
            line("Senior Data Engineer", 0.0, 20.0),
            line("at Acme Corp", 24.0, 44.0),
        ];
        assert_eq!(
            group_paragraphs(lines),
            vec!["Senior Data Engineer at Acme Corp"]
        );
    }

    #[test]
    fn test_large_gap_starts_new_paragraph() {
        let lines = vec![
            line("Experience", 0.0, 20.0),
            line("Education", 60.0, 80.0),
            line("MIT", 82.0, 102.0),
        ];
        assert_eq!(group_paragraphs(lines), vec!["Experience", "Education MIT"]);
    }

    #[test]
    fn test_engine_order_kept_and_blank_dropped() {
        let lines = vec![
            line("second", 100.0, 120.0),
            line("   ", 50.0, 70.0),
            line("first", 0.0, 20.0),
        ];
        assert_eq!(group_paragraphs(lines), vec!["second", "first"]);
    }

    #[test]
    fn test_two_columns_stay_separate() {
        let expected = vec!["Experience Acme Corp engineer", "Skills Rust Kubernetes"];

        let column_by_column = vec![
            placed("Experience", 0.0, 180.0, 0.0, 20.0),
            placed("Acme Corp engineer", 0.0, 180.0, 24.0, 44.0),
            placed("Skills", 220.0, 400.0, 0.0, 20.0),
            placed("Rust Kubernetes", 220.0, 400.0, 24.0, 44.0),
        ];
        assert_eq!(group_paragraphs(column_by_column), expected);

        let row_by_row = vec![
            placed("Experience", 0.0, 180.0, 0.0, 20.0),
            placed("Skills", 220.0, 400.0, 0.0, 20.0),
            placed("Acme Corp engineer", 0.0, 180.0, 24.0, 44.0),
            placed("Rust Kubernetes", 220.0, 400.0, 24.0, 44.0),
        ];
        assert_eq!(group_paragraphs(row_by_row), expected);
    }

    #[test]
    fn test_indented_line_still_continues_paragraph() {
        let lines = vec![
            placed("Built billing platform", 0.0, 300.0, 0.0, 20.0),
            placed("serving 2M users", 40.0, 260.0, 24.0, 44.0),
        ];
        assert_eq!(
            group_paragraphs(lines),
            vec!["Built billing platform serving 2M users"]
        );
    }

    #[test]
    fn test_no_lines_no_paragraphs() {
        assert!(group_paragraphs(vec![]).is_empty());
    }

    #[test]
    fn test_extract_image_text_joins_paragraphs_with_newline() {
        let engine = FixedOcr(vec![
            line("Jane Doe", 0.0, 30.0),
            line("Rust Developer", 100.0, 120.0),
        ]);
        let text = extract_image_text(&engine, Path::new("scan.png")).unwrap();
        assert_eq!(text, "Jane Doe\nRust Developer");
    }

    #[test]
    fn test_engine_failure_propagates_as_error() {
        let err = extract_image_text(&FailingOcr, Path::new("scan.png")).unwrap_err();
        assert!(err.to_string().contains("decoder exploded"));
    }
}
