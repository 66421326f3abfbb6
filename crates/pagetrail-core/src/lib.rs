//! # pagetrail core
//!
//! Shared, runtime-free logic for pagetrail: data models, the line
//! classifier, page reassembly, breadcrumb walking, paragraph extraction,
//! highlighting, keyword search, and the record store abstraction.
//!
//! This crate contains no tokio runtime, sqlx, or filesystem I/O. Storage
//! backends live in the application crate and plug in through
//! [`store::RecordStore`].
//!
//! ## Request flow
//!
//! ```text
//! (doc_id, page, query)
//!        │
//!        ▼
//! ┌─────────────┐   ┌──────────────┐   ┌───────────┐   ┌─────────────┐
//! │ Page store  │──▶│  Breadcrumb  │   │ Paragraph │──▶│ Highlighter │
//! │ pages ≤ P   │   │    walker    │   │ extractor │   │  <mark>…    │
//! └──────┬──────┘   └──────────────┘   └─────▲─────┘   └─────────────┘
//!        └───────────── page P text ─────────┘
//! ```
//!
//! Plain keyword search skips the walker entirely and goes through
//! [`search`] plus [`highlight`].

pub mod breadcrumb;
pub mod classify;
pub mod context;
pub mod documents;
pub mod error;
pub mod highlight;
pub mod models;
pub mod pages;
pub mod paragraph;
pub mod query;
pub mod search;
pub mod store;

pub use error::ContextError;
