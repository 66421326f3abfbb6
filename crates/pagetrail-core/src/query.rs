//! Query tokenization shared by search, breadcrumb walking, extraction,
//! and highlighting.

/// Split a query on whitespace and lowercase each token.
///
/// Tokens shorter than `min_term_len` characters are dropped; `0` and `1`
/// keep everything. Order and duplicates are preserved so scoring matches
/// what the user typed.
pub fn tokenize(query: &str, min_term_len: usize) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= min_term_len.max(1))
        .collect()
}

/// True if `line` contains any of the (already lowercase) terms,
/// compared case-insensitively.
pub fn contains_any(line: &str, terms: &[String]) -> bool {
    if terms.is_empty() {
        return false;
    }
    let lower = line.to_lowercase();
    terms
        .iter()
        .any(|t| !t.is_empty() && lower.contains(t.as_str()))
}

/// Sum of non-overlapping occurrence counts of each term in `text`.
pub fn term_frequency(text: &str, terms: &[String]) -> u64 {
    let lower = text.to_lowercase();
    terms
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| lower.matches(t.as_str()).count() as u64)
        .sum()
}

/// Byte offset of the first case-insensitive occurrence of `term` in
/// `text`, measured in `text` itself (not in its lowercased copy, whose
/// byte layout can differ).
pub fn find_case_insensitive(text: &str, term: &str) -> Option<usize> {
    if term.is_empty() {
        return None;
    }
    text.char_indices()
        .map(|(i, _)| i)
        .find(|&i| starts_with_case_insensitive(&text[i..], term))
}

fn starts_with_case_insensitive(haystack: &str, lower_needle: &str) -> bool {
    let mut hay = haystack.chars().flat_map(char::to_lowercase);
    lower_needle.chars().all(|n| hay.next() == Some(n))
}
