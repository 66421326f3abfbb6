//! Paragraph extraction.
//!
//! Finds the block of body text on a page that best answers a query.
//!
//! # Algorithm
//!
//! 1. Segment the page into [`Block`]s: runs of non-blank body lines, closed
//!    by a blank line or a heading. Each heading becomes its own one-line
//!    block. TOC noise and running headers close the current block and are
//!    dropped.
//! 2. Score each block by summed case-insensitive term occurrences.
//! 3. Return the highest-scoring block (earliest wins ties), preceded by the
//!    block before it when that one is body text.
//! 4. No block scores: return a character window around the first
//!    occurrence of the first matching term in the raw page text, with an
//!    ellipsis on each truncated side.
//! 5. No term occurs at all: return the first `prefix_chars` characters.
//!
//! All bounds are measured in characters.

use tracing::debug;

use crate::classify::{Classifier, LineKind};
use crate::query::{find_case_insensitive, term_frequency};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Body,
    Heading,
}

/// Atomic unit of paragraph extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Trimmed lines joined with `\n`.
    pub text: String,
}

/// Tuning for [`extract_paragraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Prepend the preceding body block as leading context.
    pub include_context: bool,
    /// Characters kept before the match in the window fallback.
    pub window_before: usize,
    /// Characters kept from the match onward in the window fallback.
    pub window_after: usize,
    /// Length of the no-match prefix.
    pub prefix_chars: usize,
    /// Marker for a window truncated from the page bounds.
    pub ellipsis: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_context: true,
            window_before: 200,
            window_after: 400,
            prefix_chars: 600,
            ellipsis: "...".to_string(),
        }
    }
}

pub fn segment_blocks(page_text: &str, classifier: &Classifier) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in page_text.lines() {
        let classified = classifier.classify(line);
        match classified.kind {
            LineKind::Body if !classified.text.is_empty() => current.push(classified.text),
            kind => {
                flush(&mut blocks, &mut current);
                if let LineKind::Heading(_) = kind {
                    blocks.push(Block {
                        kind: BlockKind::Heading,
                        text: classified.text.to_string(),
                    });
                }
            }
        }
    }
    flush(&mut blocks, &mut current);

    blocks
}

fn flush(blocks: &mut Vec<Block>, current: &mut Vec<&str>) {
    if !current.is_empty() {
        blocks.push(Block {
            kind: BlockKind::Body,
            text: current.join("\n"),
        });
        current.clear();
    }
}

/// Index of the highest-scoring block, earliest on ties; `None` if every
/// block scores zero.
pub fn best_block(blocks: &[Block], terms: &[String]) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (index, block) in blocks.iter().enumerate() {
        let score = term_frequency(&block.text, terms);
        if score > 0 && best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// Extract the paragraph answering `terms` from one page. Never empty
/// unless the page itself is.
pub fn extract_paragraph(
    page_text: &str,
    terms: &[String],
    classifier: &Classifier,
    options: &ExtractOptions,
) -> String {
    if page_text.is_empty() {
        return String::new();
    }

    let terms: Vec<String> = terms
        .iter()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let blocks = segment_blocks(page_text, classifier);
    if let Some(best) = best_block(&blocks, &terms) {
        debug!(block = best, blocks = blocks.len(), "paragraph block selected");
        let mut parts: Vec<&str> = Vec::with_capacity(2);
        if options.include_context && best > 0 && blocks[best - 1].kind == BlockKind::Body {
            parts.push(&blocks[best - 1].text);
        }
        parts.push(&blocks[best].text);
        return parts.join("\n\n");
    }

    if let Some(window) = window_around_first_match(page_text, &terms, options) {
        debug!("no block scored; using character window");
        return window;
    }

    page_text.chars().take(options.prefix_chars).collect()
}

fn window_around_first_match(
    page_text: &str,
    terms: &[String],
    options: &ExtractOptions,
) -> Option<String> {
    let byte_pos = terms
        .iter()
        .find_map(|t| find_case_insensitive(page_text, t))?;

    let match_char = page_text[..byte_pos].chars().count();
    let total = page_text.chars().count();
    let start = match_char.saturating_sub(options.window_before);
    let end = total.min(match_char + options.window_after);

    let mut out = String::new();
    if start > 0 {
        out.push_str(&options.ellipsis);
    }
    out.extend(page_text.chars().skip(start).take(end - start));
    if end < total {
        out.push_str(&options.ellipsis);
    }
    Some(out)
}
