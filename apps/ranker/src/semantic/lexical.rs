//! Hashed bag-of-words embedder.
//!
//! Always available, needs no model files. Used when the `candle` backend is disabled or
//! not configured, and in tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{EmbedError, SentenceEmbedder};

pub const DEFAULT_DIMENSION: usize = 512;

pub struct LexicalEmbedder {
    dimension: usize,
}

impl LexicalEmbedder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn bucket(&self, term: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        term.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceEmbedder for LexicalEmbedder {
    fn model_name(&self) -> &str {
        "lexical"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0.0f32; self.dimension];
        let terms = text
            .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        for term in terms {
            vector[self.bucket(&term)] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}
