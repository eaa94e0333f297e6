/// Punctuation delimiters replaced by spaces before phrase/entity extraction.
const DELIMITERS: &[char] = &[',', ':', ';', '|', '(', ')', '[', ']', '{', '}'];

/// Normalizes text for the NLP pipeline.
///
/// Collapses whitespace, replaces non-ASCII characters and the delimiter set with spaces,
/// and trims. `clean(clean(x)) == clean(x)`.
pub fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() || !c.is_ascii() || DELIMITERS.contains(&c) {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}
