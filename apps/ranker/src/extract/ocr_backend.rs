//! CPU OCR backend built on `ocrs` + `rten`.

use std::path::Path;
use std::sync::Mutex;

use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use rten::Model;
use tracing::{debug, info};

use super::{ExtractError, OcrEngine, OcrLine};

/// Wraps an `ocrs` engine. Calls are serialized through a mutex.
pub struct OcrsBackend {
    engine: Mutex<OcrsEngine>,
}

impl OcrsBackend {
    /// Loads the text detection and recognition models (`.rten` files).
    pub fn load(detection_model: &Path, recognition_model: &Path) -> Result<Self, ExtractError> {
        info!(
            "Loading OCR models: detection={:?} recognition={:?}",
            detection_model, recognition_model
        );

        let detection = Model::load_file(detection_model)
            .map_err(|e| ExtractError::Ocr(format!("failed to load detection model: {e}")))?;
        let recognition = Model::load_file(recognition_model)
            .map_err(|e| ExtractError::Ocr(format!("failed to load recognition model: {e}")))?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection),
            recognition_model: Some(recognition),
            ..Default::default()
        })
        .map_err(|e| ExtractError::Ocr(format!("failed to build OCR engine: {e}")))?;

        info!("OCR engine ready");
        Ok(Self {
            engine: Mutex::new(engine),
        })
    }
}

impl OcrEngine for OcrsBackend {
    fn recognize_lines(&self, path: &Path) -> Result<Vec<OcrLine>, ExtractError> {
        let img = image::open(path)
            .map_err(|e| ExtractError::Ocr(format!("failed to decode image: {e}")))?
            .into_rgb8();

        let source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| ExtractError::Ocr(format!("invalid image layout: {e}")))?;

        let engine = self
            .engine
            .lock()
            .map_err(|_| ExtractError::Ocr("OCR engine lock poisoned".to_string()))?;

        let input = engine
            .prepare_input(source)
            .map_err(|e| ExtractError::Ocr(e.to_string()))?;
        let words = engine
            .detect_words(&input)
            .map_err(|e| ExtractError::Ocr(e.to_string()))?;
        let line_rects = engine.find_text_lines(&input, &words);
        let recognized = engine
            .recognize_text(&input, &line_rects)
            .map_err(|e| ExtractError::Ocr(e.to_string()))?;

        let lines: Vec<OcrLine> = recognized
            .iter()
            .flatten()
            .map(|line| {
                let rect = line.bounding_rect();
                OcrLine {
                    text: line.to_string(),
                    left: rect.left() as f32,
                    right: rect.right() as f32,
                    top: rect.top() as f32,
                    bottom: rect.bottom() as f32,
                }
            })
            .collect();

        debug!("OCR recognized {} lines in {:?}", lines.len(), path);
        Ok(lines)
    }
}
