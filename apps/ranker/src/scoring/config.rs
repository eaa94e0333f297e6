use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Weights, caps and thresholds used by the scoring engine.
/// Every field falls back to its default when missing from a JSON override file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub max_phrases: usize,
    /// Cap on the unfiltered entity list; also the denominator of the entity component.
    pub entity_limit: usize,
    pub insight_limit: usize,
    pub min_word_count: usize,
    pub min_phrase_count: usize,
    pub entity_weight: f64,
    pub richness_weight: f64,
    pub semantic_weight: f64,
    pub weak_match_threshold: f64,
    /// Share of symbol characters above which a formatting flag is raised.
    pub format_noise_ratio: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_phrases: 160,
            entity_limit: 30,
            insight_limit: 20,
            min_word_count: 200,
            min_phrase_count: 25,
            entity_weight: 30.0,
            richness_weight: 30.0,
            semantic_weight: 40.0,
            weak_match_threshold: 0.4,
            format_noise_ratio: 0.25,
        }
    }
}

impl ScoringConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid scoring config {}", path.display()))
    }

    pub fn max_score(&self) -> f64 {
        self.entity_weight + self.richness_weight + self.semantic_weight
    }
}
