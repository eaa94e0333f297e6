use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::scoring::ScoringConfig;

/// Sentence embedding backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Candle,
    Lexical,
}

impl EmbeddingBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "candle" => Ok(EmbeddingBackend::Candle),
            "lexical" => Ok(EmbeddingBackend::Lexical),
            other => bail!("EMBEDDING_BACKEND must be 'candle' or 'lexical', got '{other}'"),
        }
    }
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        if cfg!(feature = "candle") {
            EmbeddingBackend::Candle
        } else {
            EmbeddingBackend::Lexical
        }
    }
}

/// Application configuration loaded from environment variables.
/// Everything has a default; model paths are optional.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub rust_log: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub scoring: ScoringConfig,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_model_dir: Option<PathBuf>,
    pub ner_model_dir: Option<PathBuf>,
    pub ocr_detection_model: Option<PathBuf>,
    pub ocr_recognition_model: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let scoring = match optional_path("SCORING_CONFIG_PATH") {
            Some(path) => ScoringConfig::from_file(&path)?,
            None => ScoringConfig::default(),
        };
        let embedding_backend = match std::env::var("EMBEDDING_BACKEND") {
            Ok(value) => EmbeddingBackend::parse(&value)?,
            Err(_) => EmbeddingBackend::default(),
        };

        Ok(AppConfig {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            upload_dir: optional_path("UPLOAD_DIR").unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: upload_limit_bytes(
                std::env::var("MAX_UPLOAD_MB")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse::<usize>()
                    .context("MAX_UPLOAD_MB must be a whole number of megabytes")?,
            )?,
            scoring,
            embedding_backend,
            embedding_model_dir: optional_path("EMBEDDING_MODEL_DIR"),
            ner_model_dir: optional_path("NER_MODEL_DIR"),
            ocr_detection_model: optional_path("OCR_DETECTION_MODEL"),
            ocr_recognition_model: optional_path("OCR_RECOGNITION_MODEL"),
        })
    }
}

fn upload_limit_bytes(megabytes: usize) -> Result<usize> {
    megabytes
        .checked_mul(1024 * 1024)
        .context("MAX_UPLOAD_MB is too large")
}

fn optional_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}
