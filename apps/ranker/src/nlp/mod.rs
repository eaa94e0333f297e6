//! NLP Signal Extractor: key phrases and named entities from CV text.
//!
//! A [`LanguagePipeline`] turns normalized text into noun chunks and labeled entities.
//! [`extract_phrases`] and [`extract_insights`] apply the filtering and capping rules on top of
//! whichever backend is configured (rule-based by default, BERT NER with the `candle` feature).

#[cfg(feature = "candle")]
pub mod bert;
pub mod lexicon;
pub mod normalize;
pub mod rules;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub use normalize::clean;

#[derive(Debug, Error)]
pub enum NlpError {
    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Entity categories. Covers both OntoNotes and CoNLL tag sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityLabel {
    Organization,
    Product,
    CreativeWork,
    GeopoliticalEntity,
    Event,
    Person,
    Location,
    Date,
    Other,
}

impl EntityLabel {
    /// Parses a model tag such as `ORG`, `WORK_OF_ART` or `B-PER` (prefix already stripped).
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "ORG" | "ORGANIZATION" => EntityLabel::Organization,
            "PRODUCT" => EntityLabel::Product,
            "WORK_OF_ART" => EntityLabel::CreativeWork,
            "GPE" => EntityLabel::GeopoliticalEntity,
            "EVENT" => EntityLabel::Event,
            "PER" | "PERSON" => EntityLabel::Person,
            "LOC" | "LOCATION" | "FAC" => EntityLabel::Location,
            "DATE" | "TIME" => EntityLabel::Date,
            _ => EntityLabel::Other,
        }
    }

    /// Labels whose entities count towards the entity score and user-facing insights.
    pub fn is_insight(self) -> bool {
        matches!(
            self,
            EntityLabel::Organization
                | EntityLabel::Product
                | EntityLabel::CreativeWork
                | EntityLabel::GeopoliticalEntity
                | EntityLabel::Event
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Output of one pipeline run, spans in text order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub noun_chunks: Vec<String>,
    pub entities: Vec<Entity>,
}

/// Linguistic pipeline producing noun chunks and named entities from normalized text.
pub trait LanguagePipeline: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, text: &str) -> Result<Analysis, NlpError>;
}

/// Cleans `text` and runs the pipeline. Empty text never reaches the pipeline;
/// a failing pipeline is logged and treated as producing nothing.
pub fn analyze_text(pipeline: &dyn LanguagePipeline, text: &str) -> Option<Analysis> {
    let cleaned = clean(text);
    if cleaned.is_empty() {
        return None;
    }

    match pipeline.analyze(&cleaned) {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            warn!("NLP pipeline '{}' failed: {e}", pipeline.name());
            None
        }
    }
}

/// Skill-like phrases: lowercased noun chunks then entities, first-seen order, capped.
pub fn extract_phrases(pipeline: &dyn LanguagePipeline, text: &str, max_phrases: usize) -> Vec<String> {
    analyze_text(pipeline, text)
        .map(|analysis| phrases_from(&analysis, max_phrases))
        .unwrap_or_default()
}

/// Allowed-label entities, deduplicated and sorted ascending, capped.
pub fn extract_insights(pipeline: &dyn LanguagePipeline, text: &str, max_items: usize) -> Vec<String> {
    analyze_text(pipeline, text)
        .map(|analysis| insights_from(&analysis, max_items))
        .unwrap_or_default()
}

pub fn phrases_from(analysis: &Analysis, max_phrases: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut phrases = Vec::new();

    let candidates = analysis
        .noun_chunks
        .iter()
        .map(String::as_str)
        .chain(analysis.entities.iter().map(|e| e.text.as_str()));

    for candidate in candidates {
        if phrases.len() >= max_phrases {
            break;
        }
        let phrase = candidate.trim().to_lowercase();
        if is_valid_phrase(&phrase) && seen.insert(phrase.clone()) {
            phrases.push(phrase);
        }
    }

    phrases
}

pub fn insights_from(analysis: &Analysis, max_items: usize) -> Vec<String> {
    let mut insights: Vec<String> = analysis
        .entities
        .iter()
        .filter(|e| e.label.is_insight())
        .map(|e| e.text.trim().to_string())
        .filter(|value| value.chars().count() > 2)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    insights.sort();
    insights.truncate(max_items);
    insights
}

fn is_valid_phrase(phrase: &str) -> bool {
    phrase.chars().count() >= 2 && !phrase.contains(['|', '\\'])
}
