//! HTTP server.
//!
//! Exposes upload, search, context resolution and the document catalog as
//! a JSON API, and serves the stored PDFs so result links open at the
//! right page.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Status, version, number of indexed records |
//! | `POST`   | `/upload?name=<file.pdf>` | Index a PDF sent as the raw request body |
//! | `GET`    | `/search?q=&doc_id=&limit=` | Keyword search |
//! | `GET`    | `/chapter?doc_id=&page=&q=` | Breadcrumb and paragraph |
//! | `GET`    | `/documents` | Indexed documents |
//! | `DELETE` | `/documents/{doc_id}` | Remove a document |
//! | `GET`    | `/pdfs/{file}` | Stored source files |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `ingest_failed` (500),
//! `internal` (500).

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};

use pagetrail_core::context::{ContextRequest, ContextResolver};
use pagetrail_core::documents::list_documents;
use pagetrail_core::models::{ContextResponse, DocumentSummary, PageNumber, SearchHit};
use pagetrail_core::store::RecordStore;
use pagetrail_core::ContextError;

use crate::config::Config;
use crate::db;
use crate::documents::delete_document;
use crate::extract::is_pdf_name;
use crate::ingest::ingest_pdf;
use crate::search::search_corpus;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<dyn RecordStore>,
    resolver: Arc<ContextResolver>,
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    tokio::fs::create_dir_all(&config.documents.dir).await?;

    let state = AppState {
        store: db::open_store(config).await?,
        resolver: Arc::new(config.resolver()?),
        config: Arc::new(config.clone()),
    };

    let app = build_router(state);

    info!("listening on http://{}", bind_addr);
    println!("pagetrail server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pdfs = ServeDir::new(&state.config.documents.dir);
    let upload_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/upload",
            post(handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/search", get(handle_search))
        .route("/chapter", get(handle_chapter))
        .route("/documents", get(handle_documents))
        .route("/documents/{doc_id}", delete(handle_delete))
        .nest_service("/pdfs", pdfs)
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map core errors to their HTTP status; everything else is a 500.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<ContextError>() {
            Some(ContextError::DocumentNotFound(_)) => not_found(err.to_string()),
            Some(ContextError::InvalidPage(_)) => bad_request(err.to_string()),
            _ => {
                error!("request failed: {:#}", err);
                internal(format!("{:#}", err))
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    indexed_chunks: usize,
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let indexed_chunks = state.store.load_all().await?.len();
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        indexed_chunks,
    }))
}

// ============ POST /upload ============

#[derive(Deserialize)]
struct UploadParams {
    name: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    doc_id: String,
    doc_name: String,
    chunks_indexed: usize,
}

async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    let name = params
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| bad_request("name must not be empty"))?;
    if !is_pdf_name(&name) {
        return Err(bad_request("Only PDF files accepted"));
    }
    if body.is_empty() {
        return Err(bad_request("No file provided"));
    }

    let report = ingest_pdf(state.store.as_ref(), &state.config, body.to_vec(), &name)
        .await
        .map_err(|e| AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "ingest_failed".to_string(),
            message: format!("Failed to parse PDF: {:#}", e),
        })?;

    Ok(Json(UploadResponse {
        doc_id: report.doc_id,
        doc_name: report.doc_name,
        chunks_indexed: report.records_indexed,
    }))
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    doc_id: Option<String>,
    limit: Option<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, AppError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let doc_id = params.doc_id.as_deref().filter(|d| !d.is_empty());
    let limit = match params.limit.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            raw.parse::<usize>()
                .map_err(|_| bad_request(format!("invalid limit: {}", raw)))?,
        ),
        _ => None,
    };

    let hits =
        search_corpus(state.store.as_ref(), &state.config, query, doc_id, limit).await?;
    Ok(Json(hits))
}

// ============ GET /chapter ============

#[derive(Deserialize)]
struct ChapterParams {
    doc_id: Option<String>,
    page: Option<String>,
    q: Option<String>,
}

async fn handle_chapter(
    State(state): State<AppState>,
    Query(params): Query<ChapterParams>,
) -> Result<Json<ContextResponse>, AppError> {
    let doc_id = params.doc_id.as_deref().map(str::trim).unwrap_or_default();
    if doc_id.is_empty() {
        return Err(bad_request("doc_id must not be empty"));
    }
    let page = match params.page.as_deref() {
        Some(raw) => PageNumber::parse(raw).map_err(|e| bad_request(e.to_string()))?,
        None => PageNumber::try_from(1i64).map_err(|e| bad_request(e.to_string()))?,
    };
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();

    let req = ContextRequest {
        doc_id,
        page,
        query,
    };
    let response = state.resolver.resolve(state.store.as_ref(), &req).await?;
    Ok(Json(response))
}

// ============ /documents ============

async fn handle_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentSummary>>, AppError> {
    Ok(Json(list_documents(state.store.as_ref()).await?))
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted_chunks: usize,
    doc_id: String,
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let removed = delete_document(state.store.as_ref(), &state.config, &doc_id).await?;
    Ok(Json(DeleteResponse {
        deleted_chunks: removed.deleted_chunks,
        doc_id: removed.doc_id,
    }))
}
