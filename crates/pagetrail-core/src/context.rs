//! Context resolution: breadcrumb plus highlighted paragraph for one
//! `(doc_id, page, query)` triple.
//!
//! Pages are loaded once, bounded to the target page, and shared between
//! the breadcrumb walker and the paragraph extractor.

use anyhow::Result;
use tracing::debug;

use crate::breadcrumb::walk_pages;
use crate::classify::Classifier;
use crate::highlight::Highlighter;
use crate::models::{ContextResponse, PageNumber};
use crate::pages::pages_up_to;
use crate::paragraph::{extract_paragraph, ExtractOptions};
use crate::query::tokenize;
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct ContextRequest<'a> {
    pub doc_id: &'a str,
    pub page: PageNumber,
    /// Free text; may be empty.
    pub query: &'a str,
}

/// Everything needed to answer a [`ContextRequest`], built once from config.
#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    pub classifier: Classifier,
    pub highlighter: Highlighter,
    pub extract: ExtractOptions,
    pub min_term_len: usize,
}

impl ContextResolver {
    pub fn new(
        classifier: Classifier,
        highlighter: Highlighter,
        extract: ExtractOptions,
        min_term_len: usize,
    ) -> Self {
        Self {
            classifier,
            highlighter,
            extract,
            min_term_len,
        }
    }

    /// Resolve the breadcrumb and paragraph for a location.
    ///
    /// A document without records yields an empty response. A target page
    /// without records still gets the breadcrumb built from earlier pages,
    /// with an empty paragraph.
    pub async fn resolve<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        req: &ContextRequest<'_>,
    ) -> Result<ContextResponse> {
        let target = req.page.get();
        let pages = pages_up_to(store, req.doc_id, target).await?;
        if pages.is_empty() {
            debug!(doc_id = req.doc_id, "no pages for document");
            return Ok(ContextResponse::empty(target));
        }

        let terms = tokenize(req.query, self.min_term_len);
        let breadcrumb = walk_pages(&pages, target, &terms, &self.classifier).into_breadcrumb();

        let paragraph = match pages.get(&target) {
            Some(text) => {
                let raw = extract_paragraph(text, &terms, &self.classifier, &self.extract);
                self.highlighter.highlight(&raw, &terms)
            }
            None => String::new(),
        };

        Ok(ContextResponse {
            breadcrumb,
            paragraph,
            page: target,
        })
    }
}
