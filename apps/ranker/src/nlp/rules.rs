//! Rule-based pipeline: deterministic noun chunking and gazetteer/cue-driven entity spans.
//!
//! Chunks are maximal runs of content words (no stop words, CV action verbs or numbers),
//! capped at four words and cut at sentence ends. Entities come from:
//! - capitalized spans classified by suffix/prefix/event cues or whole-span gazetteer hits
//! - single words or word pairs found in the product/place/employer gazetteers
//! - double-quoted title-case spans (creative works)
//! - date expressions

use lazy_static::lazy_static;
use regex::Regex;

use super::lexicon::{
    contains, ACTION_VERBS, AMBIGUOUS_PRODUCTS, EVENT_CUES, GEOPOLITICAL, MONTHS, ORGANIZATIONS,
    ORG_PREFIXES, ORG_SUFFIXES, PRODUCTS, SPAN_CONNECTORS, STOP_WORDS,
};
use super::{Analysis, Entity, EntityLabel, LanguagePipeline, NlpError};

const MAX_CHUNK_WORDS: usize = 4;
const MAX_SPAN_WORDS: usize = 6;

const LEADING_PUNCT: &[char] = &['"', '\'', '-', '*', '.', '/'];
const TRAILING_PUNCT: &[char] = &['.', '!', '?', '"', '\'', '-', '/'];

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\S+").unwrap();
    static ref QUOTED_TITLE: Regex = Regex::new(r#""([A-Z][^"]{2,80})""#).unwrap();
    static ref DATE: Regex = Regex::new(
        r"(?i)\b(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{4}|\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|(?:19|20)\d{2}\s*-\s*(?:(?:19|20)\d{2}|present))\b"
    )
    .unwrap();
}

#[derive(Debug)]
struct Token<'a> {
    word: &'a str,
    lower: String,
    start: usize,
    sentence_end: bool,
}

impl Token<'_> {
    fn has_alpha(&self) -> bool {
        self.word.chars().any(|c| c.is_ascii_alphabetic())
    }

    fn is_function_word(&self) -> bool {
        contains(STOP_WORDS, &self.lower) || contains(ACTION_VERBS, &self.lower)
    }

    fn is_chunk_word(&self) -> bool {
        self.has_alpha() && !self.is_function_word()
    }

    fn is_capitalized(&self) -> bool {
        self.word.starts_with(|c: char| c.is_ascii_uppercase())
            && !self.is_function_word()
            && !contains(MONTHS, &self.lower)
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    WORD.find_iter(text)
        .filter_map(|m| {
            let raw = m.as_str();
            let leading = raw.len() - raw.trim_start_matches(LEADING_PUNCT).len();
            let word = raw.trim_start_matches(LEADING_PUNCT).trim_end_matches(TRAILING_PUNCT);
            if word.is_empty() {
                return None;
            }
            Some(Token {
                word,
                lower: word.to_ascii_lowercase(),
                start: m.start() + leading,
                sentence_end: raw.ends_with(['.', '!', '?']),
            })
        })
        .collect()
}

/// Deterministic pipeline with no model files. The default backend.
#[derive(Debug, Default, Clone)]
pub struct RuleBasedPipeline;

impl RuleBasedPipeline {
    pub fn new() -> Self {
        Self
    }

    /// Noun chunks only; reused by model-backed pipelines that supply their own entities.
    pub fn noun_chunks(&self, text: &str) -> Vec<String> {
        noun_chunks(&tokenize(text))
    }
}

impl LanguagePipeline for RuleBasedPipeline {
    fn name(&self) -> &str {
        "rules"
    }

    fn analyze(&self, text: &str) -> Result<Analysis, NlpError> {
        let tokens = tokenize(text);
        Ok(Analysis {
            noun_chunks: noun_chunks(&tokens),
            entities: entities(text, &tokens),
        })
    }
}

fn noun_chunks(tokens: &[Token<'_>]) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in tokens {
        if !token.is_chunk_word() {
            flush(&mut current, &mut chunks);
            continue;
        }
        current.push(token.word);
        if token.sentence_end || current.len() == MAX_CHUNK_WORDS {
            flush(&mut current, &mut chunks);
        }
    }
    flush(&mut current, &mut chunks);

    chunks
}

fn flush(current: &mut Vec<&str>, chunks: &mut Vec<String>) {
    if !current.is_empty() {
        chunks.push(current.join(" "));
        current.clear();
    }
}

fn entities(text: &str, tokens: &[Token<'_>]) -> Vec<Entity> {
    let mut found: Vec<(usize, Entity)> = Vec::new();
    let mut covered = vec![false; tokens.len()];

    for (start, end) in capitalized_spans(tokens) {
        let span = &tokens[start..end];
        if let Some(label) = classify_span(span) {
            found.push((span[0].start, Entity::new(join_words(span), label)));
            covered[start..end].iter_mut().for_each(|c| *c = true);
        }
    }

    let mut i = 0;
    while i < tokens.len() {
        if covered[i] {
            i += 1;
            continue;
        }
        let pair_fits = i + 1 < tokens.len() && !covered[i + 1] && !tokens[i].sentence_end;
        if pair_fits {
            if let Some(label) = gazetteer_label(&tokens[i..i + 2]) {
                found.push((tokens[i].start, Entity::new(join_words(&tokens[i..i + 2]), label)));
                i += 2;
                continue;
            }
        }
        if let Some(label) = gazetteer_label(&tokens[i..i + 1]) {
            found.push((tokens[i].start, Entity::new(tokens[i].word, label)));
        }
        i += 1;
    }

    for caps in QUOTED_TITLE.captures_iter(text) {
        if let Some(title) = caps.get(1) {
            found.push((
                title.start(),
                Entity::new(title.as_str().trim(), EntityLabel::CreativeWork),
            ));
        }
    }

    for m in DATE.find_iter(text) {
        found.push((m.start(), Entity::new(m.as_str(), EntityLabel::Date)));
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, entity)| entity).collect()
}

/// Half-open token ranges of capitalized spans, allowing lowercase connectors inside.
fn capitalized_spans(tokens: &[Token<'_>]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if !tokens[i].is_capitalized() {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = i + 1;
        let mut closed = tokens[i].sentence_end;

        while !closed && end < tokens.len() && end - start < MAX_SPAN_WORDS {
            let token = &tokens[end];
            if token.is_capitalized() {
                end += 1;
                closed = token.sentence_end;
            } else if contains(SPAN_CONNECTORS, &token.lower)
                && !token.sentence_end
                && tokens.get(end + 1).is_some_and(Token::is_capitalized)
            {
                end += 1;
            } else {
                break;
            }
        }

        while end - start > 1 && contains(SPAN_CONNECTORS, &tokens[end - 1].lower) {
            end -= 1;
        }

        spans.push((start, end));
        i = end;
    }

    spans
}

fn classify_span(span: &[Token<'_>]) -> Option<EntityLabel> {
    let joined = join_lower(span);
    let (first, last) = (&span[0].lower, &span[span.len() - 1].lower);

    if span.len() >= 2 && span.iter().any(|t| contains(EVENT_CUES, &t.lower)) {
        Some(EntityLabel::Event)
    } else if span.len() >= 2 && (contains(ORG_SUFFIXES, last) || contains(ORG_PREFIXES, first)) {
        Some(EntityLabel::Organization)
    } else if contains(ORGANIZATIONS, &joined) {
        Some(EntityLabel::Organization)
    } else if contains(GEOPOLITICAL, &joined) {
        Some(EntityLabel::GeopoliticalEntity)
    } else if contains(PRODUCTS, &joined) {
        Some(EntityLabel::Product)
    } else {
        None
    }
}

/// Proper-noun gazetteers (places, employers, ambiguous products) need a capital letter;
/// unambiguous product names match in any case.
fn gazetteer_label(words: &[Token<'_>]) -> Option<EntityLabel> {
    let joined = join_lower(words);
    let capitalized = words[0].word.starts_with(|c: char| c.is_ascii_uppercase());

    if capitalized && contains(ORGANIZATIONS, &joined) {
        Some(EntityLabel::Organization)
    } else if capitalized && contains(GEOPOLITICAL, &joined) {
        Some(EntityLabel::GeopoliticalEntity)
    } else if contains(PRODUCTS, &joined) && (capitalized || !contains(AMBIGUOUS_PRODUCTS, &joined))
    {
        Some(EntityLabel::Product)
    } else {
        None
    }
}

fn join_words(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|t| t.word).collect::<Vec<_>>().join(" ")
}

fn join_lower(tokens: &[Token<'_>]) -> String {
    tokens
        .iter()
        .map(|t| t.lower.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> Analysis {
        RuleBasedPipeline::new().analyze(text).unwrap()
    }

    fn labeled(analysis: &Analysis, label: EntityLabel) -> Vec<String> {
        analysis
            .entities
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.text.clone())
            .collect()
    }

    #[test]
    fn test_chunks_split_on_stop_words_and_verbs() {
        let a = analyze("Built scalable data pipelines for the analytics team");
        assert_eq!(a.noun_chunks, vec!["scalable data pipelines", "analytics team"]);
    }

    #[test]
    fn test_chunks_cut_at_sentence_end_and_cap() {
        let a = analyze("Cloud cost optimization. Distributed systems performance tuning reliability engineering");
        assert_eq!(
            a.noun_chunks,
            vec![
                "Cloud cost optimization",
                "Distributed systems performance tuning",
                "reliability engineering"
            ]
        );
    }

    #[test]
    fn test_numbers_break_chunks() {
        let a = analyze("Senior engineer 2019 - 2023 payments platform");
        assert_eq!(a.noun_chunks, vec!["Senior engineer", "payments platform"]);
    }

    #[test]
    fn test_organization_by_suffix_and_prefix() {
        let a = analyze("Worked at Acme Corp then studied at University of Edinburgh.");
        assert_eq!(
            labeled(&a, EntityLabel::Organization),
            vec!["Acme Corp", "University of Edinburgh"]
        );
    }

    #[test]
    fn test_known_employer_and_place() {
        let a = analyze("Software engineer at Google in Berlin and New York");
        assert_eq!(labeled(&a, EntityLabel::Organization), vec!["Google"]);
        assert_eq!(
            labeled(&a, EntityLabel::GeopoliticalEntity),
            vec!["Berlin", "New York"]
        );
    }

    #[test]
    fn test_products_any_case_except_ambiguous() {
        let a = analyze("deployed services on kubernetes with Docker and python. excel at teamwork. Excel dashboards");
        assert_eq!(
            labeled(&a, EntityLabel::Product),
            vec!["kubernetes", "Docker", "python", "Excel"]
        );
    }

    #[test]
    fn test_event_and_creative_work() {
        let a = analyze(r#"Speaker at RustConf Summit 2022 and author of "Practical Systems Design""#);
        assert_eq!(labeled(&a, EntityLabel::Event), vec!["RustConf Summit"]);
        assert_eq!(
            labeled(&a, EntityLabel::CreativeWork),
            vec!["Practical Systems Design"]
        );
    }

    #[test]
    fn test_dates_are_labeled() {
        let a = analyze("Engineer Jan 2019 - present. Certified 03/15/2021. Lead 2015 - 2018");
        let dates = labeled(&a, EntityLabel::Date);
        assert!(dates.contains(&"Jan 2019".to_string()), "{dates:?}");
        assert!(dates.contains(&"03/15/2021".to_string()), "{dates:?}");
        assert!(dates.contains(&"2015 - 2018".to_string()), "{dates:?}");
    }

    #[test]
    fn test_entities_in_text_order() {
        let a = analyze("Paris office of Acme Corp using Rust");
        let texts: Vec<&str> = a.entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Paris", "Acme Corp", "Rust"]);
    }

    #[test]
    fn test_unclassified_capitalized_span_is_not_an_entity() {
        let a = analyze("Senior Platform Engineer");
        assert!(a.entities.is_empty());
        assert_eq!(a.noun_chunks, vec!["Senior Platform Engineer"]);
    }

    #[test]
    fn test_deterministic() {
        let text = "Led migration to AWS at Shopify. Mentored engineers in Toronto.";
        assert_eq!(analyze(text), analyze(text));
    }
}
