use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DATE_LIKE: Regex = Regex::new(r"\b\d{1,2}[-/]\d{1,2}[-/]\d{2,4}\b").unwrap();
}

/// True for entity strings that should not be shown as insights:
/// email-like values, anything with a digit, and dates.
pub fn is_noise(value: &str) -> bool {
    let compact: String = value.chars().filter(|&c| c != ' ').collect();

    if compact.contains('@') && compact.contains('.') {
        return true;
    }
    if compact.chars().any(char::is_numeric) {
        return true;
    }
    DATE_LIKE.is_match(&compact)
}

/// Drops noisy entities, keeping order, and caps the result.
pub fn filter_insights(entities: &[String], limit: usize) -> Vec<String> {
    entities
        .iter()
        .filter(|e| !is_noise(e))
        .take(limit)
        .cloned()
        .collect()
}
