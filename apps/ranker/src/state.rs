use std::sync::Arc;

use crate::config::AppConfig;
use crate::scoring::ScoringEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Scoring engine with its OCR, NLP and embedding services, built once at startup.
    pub engine: Arc<ScoringEngine>,
    pub config: AppConfig,
}
