//! # pagetrail
//!
//! Breadcrumb context and keyword search over paginated PDF manuals.
//!
//! PDFs are split into per-page text records and kept in a record store
//! (a JSON file or SQLite). A query against a page returns the chapter,
//! section and subsection in effect at the first match, plus the paragraph
//! that best answers it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐
//! │   PDF    │──▶│  Extract   │──▶│ Record store │
//! │  upload  │   │ per page   │   │ JSON/SQLite  │
//! └──────────┘   └────────────┘   └──────┬───────┘
//!                                        │
//!                      ┌─────────────────┤
//!                      ▼                 ▼
//!                 ┌──────────┐     ┌──────────┐
//!                 │   CLI    │     │   HTTP   │
//!                 │ (ptrail) │     │  (axum)  │
//!                 └──────────┘     └──────────┘
//! ```
//!
//! Classification, breadcrumb walking, paragraph extraction and search
//! live in `pagetrail-core`; this crate adds storage backends, PDF
//! ingestion, configuration, the CLI and the server.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Store construction |
//! | [`migrate`] | Store initialization and SQLite schema |
//! | [`json_store`] | JSON-file record store |
//! | [`sqlite_store`] | SQLite record store |
//! | [`extract`] | PDF page text extraction |
//! | [`ingest`] | PDF ingestion pipeline |
//! | [`search`] | Corpus search frontend |
//! | [`context`] | Context resolution frontend |
//! | [`documents`] | Document listing and deletion |
//! | [`server`] | HTTP server |

pub mod config;
pub mod context;
pub mod db;
pub mod documents;
pub mod extract;
pub mod ingest;
pub mod json_store;
pub mod migrate;
pub mod search;
pub mod server;
pub mod sqlite_store;
