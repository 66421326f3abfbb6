//! # pagetrail CLI (`ptrail`)
//!
//! Index PDF manuals, search them, and resolve where in a document's
//! chapter structure a search hit lives.
//!
//! ## Usage
//!
//! ```bash
//! ptrail --config ./config/pagetrail.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ptrail init` | Create an empty record store and documents directory |
//! | `ptrail add <path>` | Index a PDF, or every PDF under a directory |
//! | `ptrail search "<query>"` | Keyword search across indexed documents |
//! | `ptrail context <doc_id> --page N --query q` | Breadcrumb and paragraph for a hit |
//! | `ptrail documents` | List indexed documents |
//! | `ptrail delete <doc_id>` | Remove a document and its source file |
//! | `ptrail serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! ptrail add ./manuals/icd10-handleiding.pdf
//! ptrail search "K35.80" --limit 5
//! ptrail context 3f1c... --page 112 --query "K35.80"
//! ptrail serve
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use pagetrail::{config, context, documents, ingest, migrate, search, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// pagetrail: breadcrumb context and keyword search over PDF manuals.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/pagetrail.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ptrail",
    about = "pagetrail: breadcrumb context and keyword search over PDF manuals",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pagetrail.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the record store and documents directory.
    ///
    /// Idempotent: an existing store keeps its records.
    Init,

    /// Index a PDF file, or every PDF under a directory.
    Add {
        /// File or directory to add.
        path: PathBuf,

        /// Display name for the document (single file only).
        #[arg(long)]
        name: Option<String>,
    },

    /// Search indexed documents.
    ///
    /// Ranks pages by how often the query terms occur in them.
    Search {
        /// The search query string.
        query: String,

        /// Only search this document.
        #[arg(long)]
        doc: Option<String>,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the chapter > section > subsection breadcrumb and the matching
    /// paragraph for a page of a document.
    Context {
        /// Document id, as shown by `ptrail documents`.
        doc_id: String,

        /// 1-based page number.
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,

        /// Query whose first match on the page anchors the breadcrumb.
        #[arg(long, default_value = "")]
        query: String,

        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List indexed documents.
    Documents,

    /// Remove a document's records and its stored PDF.
    Delete {
        /// Document id.
        doc_id: String,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_init(&cfg).await?;
            println!("Store initialized at {}.", cfg.store.path.display());
        }
        Commands::Add { path, name } => {
            ingest::run_add(&cfg, &path, name).await?;
        }
        Commands::Search { query, doc, limit } => {
            search::run_search(&cfg, &query, doc, limit).await?;
        }
        Commands::Context {
            doc_id,
            page,
            query,
            json,
        } => {
            context::run_context(&cfg, &doc_id, page, &query, json).await?;
        }
        Commands::Documents => {
            documents::run_documents(&cfg).await?;
        }
        Commands::Delete { doc_id } => {
            documents::run_delete(&cfg, &doc_id).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
