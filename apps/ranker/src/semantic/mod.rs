//! Semantic Matcher: cosine similarity between a CV's phrases and a job description.

#[cfg(feature = "candle")]
pub mod candle;
pub mod lexical;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

pub use lexical::LexicalEmbedder;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Maps a text to a dense vector. Implementations must return vectors of one fixed dimension.
pub trait SentenceEmbedder: Send + Sync {
    fn model_name(&self) -> &str;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Cosine similarity of two vectors. Zero-magnitude input yields 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, EmbedError> {
    if a.len() != b.len() {
        return Err(EmbedError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[derive(Clone)]
pub struct SemanticMatcher {
    embedder: Arc<dyn SentenceEmbedder>,
}

impl SemanticMatcher {
    pub fn new(embedder: Arc<dyn SentenceEmbedder>) -> Self {
        Self { embedder }
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Similarity between the space-joined phrases and the job description.
    pub fn similarity(&self, phrases: &[String], job_text: &str) -> Result<f64, EmbedError> {
        let cv_vector = self.embedder.embed(&phrases.join(" "))?;
        let job_vector = self.embedder.embed(job_text)?;
        let similarity = cosine_similarity(&cv_vector, &job_vector)?;
        debug!(
            "Semantic similarity {:.4} ({} phrases, model {})",
            similarity,
            phrases.len(),
            self.embedder.model_name()
        );
        Ok(similarity)
    }
}
