//! Word tokenizer shared by indexing and querying.

/// Lowercase `text` and split it on whitespace.
///
/// Repeated words are kept; callers dedupe where they need to.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
