//! Breadcrumb walker.
//!
//! Walks a document's pages in ascending order up to and including the
//! target page, feeding every classified line into a [`HierarchyPath`].
//! The resulting path describes the structure *as of* the matched location:
//!
//! - Pages before the target contribute every heading they contain.
//! - On the target page, updates stop at the first line containing a query
//!   term. Headings after that line describe content below the match and
//!   are ignored.
//! - Pages after the target are never read.
//!
//! Update rules per classification:
//!
//! | Kind | Effect |
//! |------|--------|
//! | `Heading(L)` | set level L, clear every level > L |
//! | `PageHeader` | set level 1, keep levels 2 and 3 |
//! | `Noise`, `Body` | none |

use anyhow::Result;
use tracing::debug;

use crate::classify::{ClassifiedLine, Classifier, LineKind, MAX_DEPTH};
use crate::pages::{pages_up_to, Pages};
use crate::query::contains_any;
use crate::store::RecordStore;

/// Last-seen heading text per level, levels 1..=3.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyPath {
    levels: [Option<String>; MAX_DEPTH as usize],
}

impl HierarchyPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one classified line.
    #[must_use]
    pub fn advance(self, line: &ClassifiedLine<'_>) -> Self {
        match line.kind {
            LineKind::Heading(level) => self.with_heading(level, line.text),
            LineKind::PageHeader => self.with_running_header(line.text),
            LineKind::Noise | LineKind::Body => self,
        }
    }

    /// Record a section boundary at `level`, invalidating deeper levels.
    #[must_use]
    pub fn with_heading(mut self, level: u8, text: &str) -> Self {
        let level = level.clamp(1, MAX_DEPTH) as usize;
        self.levels[level - 1] = Some(text.to_string());
        for deeper in self.levels.iter_mut().skip(level) {
            *deeper = None;
        }
        self
    }

    /// Refresh level 1 from a running header without touching levels 2 and 3.
    #[must_use]
    pub fn with_running_header(mut self, text: &str) -> Self {
        self.levels[0] = Some(text.to_string());
        self
    }

    pub fn get(&self, level: u8) -> Option<&str> {
        if !(1..=MAX_DEPTH).contains(&level) {
            return None;
        }
        self.levels[level as usize - 1].as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Option::is_none)
    }

    /// Populated levels in ascending order.
    pub fn into_breadcrumb(self) -> Vec<String> {
        self.levels.into_iter().flatten().collect()
    }
}

/// Walk `pages` up to `target_page` and return the path in effect at the
/// first query match on the target page (or at its end, if nothing matches).
pub fn walk_pages(
    pages: &Pages,
    target_page: u32,
    terms: &[String],
    classifier: &Classifier,
) -> HierarchyPath {
    let mut path = HierarchyPath::new();

    for (&page, text) in pages.range(..=target_page) {
        if page < target_page {
            path = text
                .lines()
                .map(|line| classifier.classify(line))
                .fold(path, |acc, line| acc.advance(&line));
            continue;
        }

        for (line_no, line) in text.lines().enumerate() {
            if contains_any(line, terms) {
                debug!(page, line_no, "query reached; freezing breadcrumb");
                break;
            }
            path = path.advance(&classifier.classify(line));
        }
    }

    path
}

/// Load pages `1..=target_page` for `doc_id` and resolve the breadcrumb.
///
/// An unknown document yields an empty breadcrumb.
pub async fn resolve_breadcrumb<S: RecordStore + ?Sized>(
    store: &S,
    doc_id: &str,
    target_page: u32,
    terms: &[String],
    classifier: &Classifier,
) -> Result<Vec<String>> {
    let pages = pages_up_to(store, doc_id, target_page).await?;
    Ok(walk_pages(&pages, target_page, terms, classifier).into_breadcrumb())
}
