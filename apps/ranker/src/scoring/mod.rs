//! Scoring Engine: combines entity count, phrase richness and job-description similarity
//! into a 0–100 score with advisory quality flags.
//!
//! Weights (defaults, see [`ScoringConfig`]):
//! - Named entities: 30
//! - Content richness: 30
//! - Semantic match with the job description: 40
//!
//! The engine never fails: extraction, NLP and embedding errors are logged and degrade
//! to empty text, empty signals or zero similarity respectively.

pub mod config;
pub mod handlers;
pub mod noise;
pub mod tier;
pub mod upload;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::DocumentExtractor;
use crate::nlp::{self, LanguagePipeline};
use crate::semantic::SemanticMatcher;

pub use config::ScoringConfig;
pub use tier::Tier;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// Quality flags, in the order the engine raises them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "CV is empty or unreadable")]
    EmptyOrUnreadable,
    #[serde(rename = "CV is too short")]
    TooShort,
    #[serde(rename = "Low information content")]
    LowInformation,
    #[serde(rename = "Weak match to job description")]
    WeakMatch,
    #[serde(rename = "Possible OCR or formatting issues")]
    FormattingIssues,
}

impl Flag {
    pub fn as_str(self) -> &'static str {
        match self {
            Flag::EmptyOrUnreadable => "CV is empty or unreadable",
            Flag::TooShort => "CV is too short",
            Flag::LowInformation => "Low information content",
            Flag::WeakMatch => "Weak match to job description",
            Flag::FormattingIssues => "Possible OCR or formatting issues",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64, // 0 – 100, two decimals
    pub flags: Vec<Flag>,
    pub insights: Vec<String>,
}

impl ScoreResult {
    pub fn tier(&self) -> Tier {
        Tier::from_score(self.score)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Holds the injected services. Cheap to share behind an `Arc`.
pub struct ScoringEngine {
    extractor: DocumentExtractor,
    nlp: Arc<dyn LanguagePipeline>,
    matcher: SemanticMatcher,
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(
        extractor: DocumentExtractor,
        nlp: Arc<dyn LanguagePipeline>,
        matcher: SemanticMatcher,
        config: ScoringConfig,
    ) -> Self {
        Self {
            extractor,
            nlp,
            matcher,
            config,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores the document at `path` against `job_text`. Blocking.
    pub fn score(&self, path: &Path, job_text: &str) -> ScoreResult {
        let text = self.extractor.extract_text(path);
        self.score_text(&text, job_text)
    }

    /// Scores already-extracted CV text.
    pub fn score_text(&self, text: &str, job_text: &str) -> ScoreResult {
        let cfg = &self.config;

        let analysis = nlp::analyze_text(self.nlp.as_ref(), text).unwrap_or_default();
        let phrases = nlp::phrases_from(&analysis, cfg.max_phrases);
        let entities = nlp::insights_from(&analysis, cfg.entity_limit);
        let insights = noise::filter_insights(&entities, cfg.insight_limit);

        if phrases.is_empty() {
            return ScoreResult {
                score: 0.0,
                flags: vec![Flag::EmptyOrUnreadable],
                insights,
            };
        }

        let mut flags = Vec::new();

        let word_count = text.split_whitespace().count();
        if word_count < cfg.min_word_count {
            flags.push(Flag::TooShort);
        }
        if phrases.len() < cfg.min_phrase_count {
            flags.push(Flag::LowInformation);
        }

        let mut score = share(entities.len(), cfg.entity_limit) * cfg.entity_weight
            + share(phrases.len(), cfg.max_phrases) * cfg.richness_weight;

        if !job_text.trim().is_empty() {
            let similarity = match self.matcher.similarity(&phrases, job_text) {
                Ok(sim) => sim,
                Err(e) => {
                    warn!("Semantic match failed ({}): {e}", self.matcher.model_name());
                    0.0
                }
            };
            score += similarity * cfg.semantic_weight;
            if similarity < cfg.weak_match_threshold {
                flags.push(Flag::WeakMatch);
            }
        }

        if symbol_ratio(text) > cfg.format_noise_ratio {
            flags.push(Flag::FormattingIssues);
        }

        debug!(
            "Scored CV: {} words, {} phrases, {} entities, score {:.2}",
            word_count,
            phrases.len(),
            entities.len(),
            score
        );

        ScoreResult {
            score: round2(score.clamp(0.0, 100.0)),
            flags,
            insights,
        }
    }
}

/// `min(count, limit) / limit`, or 0 for a zero limit.
fn share(count: usize, limit: usize) -> f64 {
    if limit == 0 {
        return 0.0;
    }
    count.min(limit) as f64 / limit as f64
}

/// Fraction of characters that are neither alphanumeric nor whitespace.
fn symbol_ratio(text: &str) -> f64 {
    let (mut total, mut symbols) = (0usize, 0usize);
    for c in text.chars() {
        total += 1;
        if !c.is_alphanumeric() && !c.is_whitespace() {
            symbols += 1;
        }
    }
    symbols as f64 / total.max(1) as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::{Analysis, Entity, EntityLabel, NlpError};
    use crate::semantic::{EmbedError, SentenceEmbedder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VENDORS: [&str; 10] = [
        "Acme", "Globex", "Initech", "Umbrella", "Hooli", "Vandelay", "Wonka", "Stark", "Wayne", "Tyrell",
    ];

    struct ScriptedPipeline {
        analysis: Analysis,
        calls: AtomicUsize,
    }

    impl ScriptedPipeline {
        /// `skills` generic chunks plus one chunk per vendor; each vendor is also an
        /// organization entity, so vendors do not add extra phrases.
        fn new(skills: usize, vendors: usize) -> Self {
            let mut noun_chunks: Vec<String> = (0..skills).map(|i| format!("skill {i}")).collect();
            let mut entities = Vec::new();
            for name in VENDORS.iter().take(vendors) {
                noun_chunks.push(name.to_lowercase());
                entities.push(Entity::new(*name, EntityLabel::Organization));
            }
            Self {
                analysis: Analysis {
                    noun_chunks,
                    entities,
                },
                calls: AtomicUsize::new(0),
            }
        }

        fn with_entities(mut self, entities: Vec<Entity>) -> Self {
            self.analysis.entities.extend(entities);
            self
        }
    }

    impl LanguagePipeline for ScriptedPipeline {
        fn name(&self) -> &str {
            "scripted"
        }

        fn analyze(&self, _text: &str) -> Result<Analysis, NlpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.analysis.clone())
        }
    }

    /// The CV blob embeds to `[1, 0]`, the job text to a unit vector at the given cosine.
    struct FixedSimilarity(f64);

    impl SentenceEmbedder for FixedSimilarity {
        fn model_name(&self) -> &str {
            "fixed"
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            if text.starts_with("JOB") {
                let sim = self.0 as f32;
                Ok(vec![sim, (1.0 - sim * sim).max(0.0).sqrt()])
            } else {
                Ok(vec![1.0, 0.0])
            }
        }
    }

    struct FailingEmbedder;

    impl SentenceEmbedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            Err(EmbedError::Inference("out of memory".to_string()))
        }
    }

    fn engine_with(pipeline: Arc<dyn LanguagePipeline>, embedder: Arc<dyn SentenceEmbedder>) -> ScoringEngine {
        ScoringEngine::new(
            DocumentExtractor::default(),
            pipeline,
            SemanticMatcher::new(embedder),
            ScoringConfig::default(),
        )
    }

    fn words(n: usize) -> String {
        vec!["experience"; n].join(" ")
    }

    #[test]
    fn test_unsupported_extension_hard_stops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, words(500)).unwrap();

        let pipeline = Arc::new(ScriptedPipeline::new(40, 10));
        let engine = engine_with(pipeline.clone(), Arc::new(FixedSimilarity(0.9)));
        let result = engine.score(&path, "JOB rust engineer");

        assert_eq!(result.score, 0.0);
        assert_eq!(result.flags, vec![Flag::EmptyOrUnreadable]);
        assert!(result.insights.is_empty());
        assert_eq!(pipeline.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_phrases_hard_stop_keeps_insights() {
        let pipeline = Arc::new(ScriptedPipeline::new(0, 0).with_entities(vec![
            Entity::new("Acme\\Labs", EntityLabel::Organization),
        ]));
        // A backslash disqualifies it as a phrase but not as an insight.
        let engine = engine_with(pipeline, Arc::new(FixedSimilarity(0.9)));
        let result = engine.score_text(&words(300), "JOB");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.flags, vec![Flag::EmptyOrUnreadable]);
        assert_eq!(result.insights, vec!["Acme\\Labs".to_string()]);
    }

    #[test]
    fn test_entities_and_richness_without_job_text() {
        let engine = engine_with(Arc::new(ScriptedPipeline::new(30, 10)), Arc::new(FixedSimilarity(0.9)));
        let result = engine.score_text(&words(500), "   ");

        // 10/30*30 + 40/160*30
        assert!((result.score - 17.5).abs() < 1e-9, "score was {}", result.score);
        assert!(result.flags.is_empty());
        assert_eq!(result.insights.len(), 10);
        assert_eq!(result.tier(), Tier::Low);
    }

    #[test]
    fn test_weak_semantic_match_adds_and_flags() {
        let engine = engine_with(Arc::new(ScriptedPipeline::new(30, 10)), Arc::new(FixedSimilarity(0.3)));
        let result = engine.score_text(&words(500), "JOB backend engineer");

        assert!((result.score - 29.5).abs() < 1e-9, "score was {}", result.score);
        assert_eq!(result.flags, vec![Flag::WeakMatch]);
    }

    #[test]
    fn test_symbol_heavy_text_flags_formatting() {
        let text = "##$$%%^^&& ok ".repeat(300);
        assert!(symbol_ratio(&text) > 0.4);

        let engine = engine_with(Arc::new(ScriptedPipeline::new(30, 10)), Arc::new(FixedSimilarity(0.9)));
        let result = engine.score_text(&text, "");
        assert!(result.flags.contains(&Flag::FormattingIssues));
    }

    #[test]
    fn test_short_and_sparse_cv_flags_in_order() {
        let engine = engine_with(Arc::new(ScriptedPipeline::new(5, 0)), Arc::new(FixedSimilarity(0.1)));
        let result = engine.score_text("a short cv", "JOB");
        assert_eq!(
            result.flags,
            vec![Flag::TooShort, Flag::LowInformation, Flag::WeakMatch]
        );
    }

    #[test]
    fn test_embedding_failure_scores_zero_similarity() {
        let engine = engine_with(Arc::new(ScriptedPipeline::new(30, 10)), Arc::new(FailingEmbedder));
        let result = engine.score_text(&words(500), "JOB rust");
        assert!((result.score - 17.5).abs() < 1e-9);
        assert_eq!(result.flags, vec![Flag::WeakMatch]);
    }

    #[test]
    fn test_score_monotonic_in_similarity() {
        let pipeline: Arc<dyn LanguagePipeline> = Arc::new(ScriptedPipeline::new(60, 8));
        let mut previous = f64::MIN;
        for step in 0..=10 {
            let engine = engine_with(pipeline.clone(), Arc::new(FixedSimilarity(step as f64 / 10.0)));
            let score = engine.score_text(&words(400), "JOB").score;
            assert!(score >= previous, "score dropped at step {step}: {score} < {previous}");
            previous = score;
        }
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let engine = engine_with(Arc::new(ScriptedPipeline::new(12, 3)), Arc::new(FixedSimilarity(0.2)));
        let text = "Tools: C++ / C# !!! ".repeat(20);
        let first = engine.score_text(&text, "JOB");
        let second = engine.score_text(&text, "JOB");
        assert_eq!(first, second);
    }

    #[test]
    fn test_score_range_and_precision() {
        let engine = ScoringEngine::new(
            DocumentExtractor::default(),
            Arc::new(ScriptedPipeline::new(200, 10)),
            SemanticMatcher::new(Arc::new(FixedSimilarity(1.0))),
            ScoringConfig {
                semantic_weight: 90.0,
                ..ScoringConfig::default()
            },
        );
        assert_eq!(engine.score_text(&words(500), "JOB").score, 100.0);

        let engine = engine_with(Arc::new(ScriptedPipeline::new(3, 0)), Arc::new(FixedSimilarity(0.0)));
        let score = engine.score_text(&words(500), "").score;
        // 3/160*30 = 0.5625
        assert_eq!(score, 0.56);
        assert_eq!(score, round2(score));
    }

    #[test]
    fn test_caps_applied() {
        let many_orgs: Vec<Entity> = (0..50)
            .map(|i| {
                let name = format!("Org{}{}", char::from(b'A' + (i / 26) as u8), char::from(b'A' + (i % 26) as u8));
                Entity::new(name, EntityLabel::Organization)
            })
            .collect();
        let pipeline = ScriptedPipeline::new(300, 0).with_entities(many_orgs);
        let engine = engine_with(Arc::new(pipeline), Arc::new(FixedSimilarity(0.5)));
        let result = engine.score_text(&words(500), "");

        // richness and entity components both saturate
        assert!((result.score - 60.0).abs() < 1e-9);
        assert_eq!(result.insights.len(), 20);
        let mut sorted = result.insights.clone();
        sorted.sort();
        assert_eq!(result.insights, sorted);
    }

    #[test]
    fn test_noisy_entities_count_but_are_not_insights() {
        let pipeline = ScriptedPipeline::new(31, 2).with_entities(vec![
            Entity::new("Python 3", EntityLabel::Product),
            Entity::new("jane@acme.com", EntityLabel::Organization),
        ]);
        let engine = engine_with(Arc::new(pipeline), Arc::new(FixedSimilarity(0.5)));
        let result = engine.score_text(&words(500), "");
        assert_eq!(result.insights, vec!["Acme", "Globex"]);
        // 4 entities counted: 4/30*30 = 4, phrases 35/160*30 = 6.5625
        assert!((result.score - 10.56).abs() < 1e-9, "score was {}", result.score);
    }

    #[test]
    fn test_flag_serializes_as_message() {
        assert_eq!(
            serde_json::to_string(&Flag::WeakMatch).unwrap(),
            "\"Weak match to job description\""
        );
        assert_eq!(Flag::TooShort.to_string(), "CV is too short");
    }
}
