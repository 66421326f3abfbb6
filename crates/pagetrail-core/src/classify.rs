//! Line classifier.
//!
//! Extracted page text carries no structure metadata, so every line is
//! classified on its own by a fixed, ordered list of patterns. The first
//! pattern that matches wins:
//!
//! | Order | Pattern | Result |
//! |-------|---------|--------|
//! | 1 | blank, or longer than `max_line_chars` | [`LineKind::Body`] |
//! | 2 | leader dots (`. . .`, `....`) anywhere | [`LineKind::Noise`] |
//! | 3 | `<int> <Title> <int>` running header | [`LineKind::PageHeader`] |
//! | 4 | `<dotted numeral> <Title>` | [`LineKind::Heading`] at depth `dots + 1`, max 3 |
//! | 5 | `<keyword> <text>` | [`LineKind::Heading`] at level 1 |
//! | 6 | anything else | [`LineKind::Body`] |
//!
//! TOC noise is checked before headings because a TOC entry such as
//! `8.4 Codeervoorbeelden ........ 112` also fits the numeral grammar, and
//! running headers are checked before numeral headings because
//! `8 Codeervoorbeelden 112` fits both.

use regex::Regex;

use crate::error::ContextError;

/// Deepest hierarchy level tracked by breadcrumbs.
pub const MAX_DEPTH: u8 = 3;

const NUMERAL_HEADING: &str = r"^(\d+(?:\.\d+)*)\s+([\p{Lu}\p{Lt}].{1,100})$";
const PAGE_HEADER: &str = r"^(\d{1,3})\s+([\p{Lu}\p{Lt}].{0,79}?)\s+(\d{1,4})$";
const TOC_LEADER: &str = r"\.(?:[ \t]*\.){2,}";

/// Classification of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Body,
    /// Table-of-contents leader line; never structural, never displayed.
    Noise,
    /// Running chapter header repeated on each page. Refreshes level 1
    /// without invalidating deeper levels.
    PageHeader,
    /// Content heading at depth 1..=3.
    Heading(u8),
}

/// A line paired with its classification. `text` is the trimmed line; for
/// page headers the trailing page number is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    pub kind: LineKind,
    pub text: &'a str,
}

impl ClassifiedLine<'_> {
    pub fn is_heading(&self) -> bool {
        matches!(self.kind, LineKind::Heading(_))
    }
}

/// Which heading forms apply to a corpus.
///
/// Numbered headings are always recognised; running headers and the keyword
/// fallback can be switched off for documents where they misfire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingGrammar {
    pub page_headers: bool,
    pub keyword_fallback: bool,
    /// Chapter/section keywords, matched case-insensitively at line start.
    pub keywords: Vec<String>,
    /// Lines longer than this (in characters) are always body prose.
    pub max_line_chars: usize,
}

impl Default for HeadingGrammar {
    fn default() -> Self {
        Self {
            page_headers: true,
            keyword_fallback: true,
            keywords: default_keywords(),
            max_line_chars: 150,
        }
    }
}

pub fn default_keywords() -> Vec<String> {
    [
        "Hoofdstuk",
        "Sectie",
        "Afdeling",
        "Chapitre",
        "Section",
        "Chapter",
        "Part",
        "Deel",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Compiled classifier for one [`HeadingGrammar`].
#[derive(Debug, Clone)]
pub struct Classifier {
    numeral: Regex,
    page_header: Option<Regex>,
    toc_leader: Regex,
    keyword: Option<Regex>,
    max_line_chars: usize,
}

impl Classifier {
    pub fn new(grammar: &HeadingGrammar) -> Result<Self, ContextError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ContextError::Grammar(e.to_string()))
        };

        let keyword = if grammar.keyword_fallback && !grammar.keywords.is_empty() {
            let alternatives = grammar
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(regex::escape)
                .collect::<Vec<_>>();
            if alternatives.is_empty() {
                None
            } else {
                Some(compile(&format!(
                    r"(?i)^(?:{})\s+.{{1,80}}$",
                    alternatives.join("|")
                ))?)
            }
        } else {
            None
        };

        Ok(Self {
            numeral: compile(NUMERAL_HEADING)?,
            page_header: if grammar.page_headers {
                Some(compile(PAGE_HEADER)?)
            } else {
                None
            },
            toc_leader: compile(TOC_LEADER)?,
            keyword,
            max_line_chars: grammar.max_line_chars,
        })
    }

    pub fn classify<'a>(&self, line: &'a str) -> ClassifiedLine<'a> {
        let text = line.trim();
        let body = ClassifiedLine {
            kind: LineKind::Body,
            text,
        };

        if text.is_empty() || text.chars().count() > self.max_line_chars {
            return body;
        }

        if self.toc_leader.is_match(text) {
            return ClassifiedLine {
                kind: LineKind::Noise,
                text,
            };
        }

        if let Some(header) = &self.page_header {
            if let Some(caps) = header.captures(text) {
                let end = caps.get(2).map(|m| m.end()).unwrap_or(text.len());
                return ClassifiedLine {
                    kind: LineKind::PageHeader,
                    text: text[..end].trim_end(),
                };
            }
        }

        if let Some(caps) = self.numeral.captures(text) {
            let dots = caps
                .get(1)
                .map(|m| m.as_str().matches('.').count())
                .unwrap_or(0);
            let depth = (dots + 1).min(MAX_DEPTH as usize) as u8;
            return ClassifiedLine {
                kind: LineKind::Heading(depth),
                text,
            };
        }

        if let Some(keyword) = &self.keyword {
            if keyword.is_match(text) {
                return ClassifiedLine {
                    kind: LineKind::Heading(1),
                    text,
                };
            }
        }

        body
    }

    pub fn is_heading(&self, line: &str) -> bool {
        self.classify(line).is_heading()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&HeadingGrammar::default()).expect("default heading grammar is valid")
    }
}
