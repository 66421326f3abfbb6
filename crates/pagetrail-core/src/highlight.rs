//! Query term highlighting.
//!
//! Each term is applied independently over the output of the previous
//! term, so a later term may match inside an earlier marker (querying
//! `mark` re-wraps the tag text). That is accepted behavior.

use regex::{Captures, RegexBuilder};

use crate::query::find_case_insensitive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighter {
    open: String,
    close: String,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new("<mark>", "</mark>")
    }
}

impl Highlighter {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Wrap every case-insensitive occurrence of each term.
    pub fn highlight(&self, text: &str, terms: &[String]) -> String {
        let mut out = text.to_string();
        for term in terms.iter().filter(|t| !t.is_empty()) {
            let re = match RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => re,
                Err(_) => continue,
            };
            out = re
                .replace_all(&out, |caps: &Captures<'_>| {
                    format!("{}{}{}", self.open, &caps[0], self.close)
                })
                .into_owned();
        }
        out
    }

    /// A `window`-character excerpt centered on the earliest occurrence of
    /// any term, highlighted. Without a match, the first `window` characters.
    pub fn snippet(&self, text: &str, terms: &[String], window: usize) -> String {
        let earliest = terms
            .iter()
            .filter_map(|t| find_case_insensitive(text, t))
            .min();

        let excerpt = match earliest {
            None => text.chars().take(window).collect(),
            Some(byte_pos) => {
                let center = text[..byte_pos].chars().count();
                let total = text.chars().count();
                let start = center.saturating_sub(window / 2);
                let end = total.min(center + window / 2);
                let mut s = String::new();
                if start > 0 {
                    s.push_str("...");
                }
                s.extend(text.chars().skip(start).take(end - start));
                if end < total {
                    s.push_str("...");
                }
                s
            }
        };

        self.highlight(&excerpt, terms)
    }
}
