//! TOML configuration.
//!
//! Only `[store]` is required. Every other section falls back to defaults
//! that reproduce the behavior of a stock install.
//!
//! ```toml
//! [store]
//! backend = "json"            # or "sqlite"
//! path = "./data/index.json"
//!
//! [documents]
//! dir = "./data/pdfs"
//!
//! [search]
//! default_limit = 30
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use pagetrail_core::classify::{default_keywords, Classifier, HeadingGrammar};
use pagetrail_core::context::ContextResolver;
use pagetrail_core::highlight::Highlighter;
use pagetrail_core::paragraph::ExtractOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub headings: HeadingsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Json,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    pub path: PathBuf,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Json
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    #[serde(default = "default_documents_dir")]
    pub dir: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: default_documents_dir(),
        }
    }
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("./data/pdfs")
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_max_record_chars")]
    pub max_record_chars: usize,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_record_chars: default_max_record_chars(),
            include_globs: default_include_globs(),
        }
    }
}

fn default_max_record_chars() -> usize {
    8000
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*.pdf".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    /// Query terms shorter than this many characters are dropped.
    #[serde(default = "default_min_term_len")]
    pub min_term_len: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            min_term_len: default_min_term_len(),
        }
    }
}

fn default_min_term_len() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    #[serde(default = "default_true")]
    pub include_context: bool,
    #[serde(default = "default_window_before")]
    pub window_before: usize,
    #[serde(default = "default_window_after")]
    pub window_after: usize,
    #[serde(default = "default_prefix_chars")]
    pub prefix_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            include_context: true,
            window_before: default_window_before(),
            window_after: default_window_after(),
            prefix_chars: default_prefix_chars(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_window_before() -> usize {
    200
}
fn default_window_after() -> usize {
    400
}
fn default_prefix_chars() -> usize {
    600
}

#[derive(Debug, Deserialize, Clone)]
pub struct HighlightConfig {
    #[serde(default = "default_open")]
    pub open: String,
    #[serde(default = "default_close")]
    pub close: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            open: default_open(),
            close: default_close(),
        }
    }
}

fn default_open() -> String {
    "<mark>".to_string()
}
fn default_close() -> String {
    "</mark>".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HeadingsConfig {
    #[serde(default = "default_true")]
    pub page_headers: bool,
    #[serde(default = "default_true")]
    pub keyword_fallback: bool,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,
}

impl Default for HeadingsConfig {
    fn default() -> Self {
        Self {
            page_headers: true,
            keyword_fallback: true,
            keywords: default_keywords(),
            max_line_chars: default_max_line_chars(),
        }
    }
}

fn default_max_line_chars() -> usize {
    150
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_snippet_window")]
    pub snippet_window: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            snippet_window: default_snippet_window(),
        }
    }
}

fn default_limit() -> usize {
    30
}
fn default_max_limit() -> usize {
    100
}
fn default_snippet_window() -> usize {
    250
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}
fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

impl Config {
    pub fn heading_grammar(&self) -> HeadingGrammar {
        HeadingGrammar {
            page_headers: self.headings.page_headers,
            keyword_fallback: self.headings.keyword_fallback,
            keywords: self.headings.keywords.clone(),
            max_line_chars: self.headings.max_line_chars,
        }
    }

    pub fn highlighter(&self) -> Highlighter {
        Highlighter::new(self.highlight.open.clone(), self.highlight.close.clone())
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            include_context: self.extract.include_context,
            window_before: self.extract.window_before,
            window_after: self.extract.window_after,
            prefix_chars: self.extract.prefix_chars,
            ..ExtractOptions::default()
        }
    }

    /// Build the context resolver described by this config.
    pub fn resolver(&self) -> Result<ContextResolver> {
        let classifier = Classifier::new(&self.heading_grammar())
            .context("invalid [headings] configuration")?;
        Ok(ContextResolver::new(
            classifier,
            self.highlighter(),
            self.extract_options(),
            self.query.min_term_len,
        ))
    }

    /// Clamp a requested result count into `[1, max_limit]`.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.search.default_limit)
            .clamp(1, self.search.max_limit)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.store.path.as_os_str().is_empty() {
        bail!("store.path must not be empty");
    }

    if config.ingest.max_record_chars == 0 {
        bail!("ingest.max_record_chars must be > 0");
    }

    if config.search.max_limit < 1 {
        bail!("search.max_limit must be >= 1");
    }
    if config.search.default_limit < 1 || config.search.default_limit > config.search.max_limit {
        bail!(
            "search.default_limit must be in [1, {}]",
            config.search.max_limit
        );
    }
    if config.search.snippet_window == 0 {
        bail!("search.snippet_window must be > 0");
    }

    if config.headings.max_line_chars == 0 {
        bail!("headings.max_line_chars must be > 0");
    }
    if config.headings.keyword_fallback && config.headings.keywords.is_empty() {
        bail!("headings.keywords must not be empty when keyword_fallback is enabled");
    }

    if config.highlight.open.is_empty() || config.highlight.close.is_empty() {
        bail!("highlight.open and highlight.close must not be empty");
    }

    if config.server.max_upload_bytes == 0 {
        bail!("server.max_upload_bytes must be > 0");
    }

    Ok(config)
}
