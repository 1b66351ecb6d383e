// Text helpers shared by extraction, RAG assembly and prompt building

use std::collections::HashSet;

use regex::Regex;
use std::sync::OnceLock;

pub const ELLIPSIS: &str = "…";

/// Truncates to `max_chars` characters, appending `suffix` only when
/// something was cut.
pub fn truncate_chars(text: &str, max_chars: usize, suffix: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], suffix),
        None => text.to_string(),
    }
}

/// Rough token estimate used for context budgeting: words × 1.3, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words * 13).div_ceil(10)
}

/// Number of whole words that fit in a token budget under `estimate_tokens`.
pub fn words_for_tokens(tokens: usize) -> usize {
    tokens * 10 / 13
}

/// First `n` whitespace-separated words, joined by single spaces.
pub fn take_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

fn keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w{4,}\b").expect("keyword regex is valid"))
}

/// Lowercased words of four or more word characters.
pub fn keywords(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    keyword_regex()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}
