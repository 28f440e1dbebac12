//! HTTP API for interactive front-ends.
//!
//! One server process holds one in-memory [`Session`]: files are uploaded,
//! searched, listed, and dropped through the endpoints below. Nothing is
//! persisted; restarting the server starts an empty session.
//!
//! # Endpoints
//!
//! | Method   | Path                | Description |
//! |----------|---------------------|-------------|
//! | `GET`    | `/health`           | Health check (returns version) |
//! | `GET`    | `/documents`        | List uploaded documents with sizes |
//! | `POST`   | `/documents`        | Upload files (base64) and ingest them |
//! | `DELETE` | `/documents`        | Clear the session |
//! | `DELETE` | `/documents/{name}` | Remove one document |
//! | `POST`   | `/search`           | Keyword search with context windows |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "files must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! Per-file extraction failures are not errors; they are listed in the
//! upload's [`IngestReport`].

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::{Any, CorsLayer};

use docfind_core::models::Document;
use docfind_core::session::Session;

use crate::config::Config;
use crate::extract::{ExtractError, ExtractorChain};
use crate::ingest::{extract_document, BatchPlan, IngestReport};
use crate::search::{search_session, SearchResponse};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    chain: Arc<ExtractorChain>,
    session: Arc<Mutex<Session>>,
}

/// Starts the HTTP server on `[server].bind` and runs until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(config);

    println!("docfind listening on http://{}", bind_addr);
    tracing::info!(bind = %bind_addr, "server started");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes with a fresh, empty session.
pub fn router(config: &Config) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        chain: Arc::new(ExtractorChain::from_config(&config.extract)),
        session: Arc::new(Mutex::new(Session::new())),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/documents",
            get(handle_list_documents)
                .post(handle_upload)
                .delete(handle_clear),
        )
        .route("/documents/{name}", delete(handle_remove))
        .route("/search", post(handle_search))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
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

fn lock_session(state: &AppState) -> Result<MutexGuard<'_, Session>, AppError> {
    state
        .session
        .lock()
        .map_err(|_| internal("session state is unavailable"))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /documents ============

#[derive(Serialize)]
struct DocumentInfo {
    name: String,
    content_hash: String,
    /// Uploaded size in bytes.
    size: u64,
    sentences: usize,
}

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<DocumentInfo>,
    total_bytes: u64,
}

async fn handle_list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let session = lock_session(&state)?;
    let documents: Vec<DocumentInfo> = session
        .documents()
        .iter()
        .map(|d| DocumentInfo {
            name: d.name.clone(),
            content_hash: d.content_hash.clone(),
            size: d.size,
            sentences: d.sentence_count(),
        })
        .collect();
    let total_bytes = documents.iter().map(|d| d.size).sum();
    Ok(Json(DocumentListResponse {
        documents,
        total_bytes,
    }))
}

// ============ POST /documents ============

#[derive(Deserialize)]
struct UploadRequest {
    files: Vec<UploadFile>,
}

#[derive(Deserialize)]
struct UploadFile {
    name: String,
    content_base64: String,
}

/// Decode, dedupe against the session, extract outside the lock, then store.
async fn handle_upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<IngestReport>, AppError> {
    if req.files.is_empty() {
        return Err(bad_request("files must not be empty"));
    }

    let mut report = IngestReport::default();
    let mut plan = BatchPlan::default();
    {
        let mut session = lock_session(&state)?;
        for file in req.files {
            let name = file.name.trim().to_string();
            if name.is_empty() {
                return Err(bad_request("file name must not be empty"));
            }
            match base64::engine::general_purpose::STANDARD.decode(&file.content_base64) {
                Ok(bytes) => plan.admit(&mut session, &mut report, name, bytes),
                Err(e) => report.record_failure(&name, format!("invalid base64: {}", e)),
            }
        }
    }

    let chain = state.chain.clone();
    let pending = plan.take_pending();
    let extracted: Vec<(String, Result<Document, ExtractError>)> =
        tokio::task::spawn_blocking(move || {
            pending
                .into_iter()
                .map(|file| {
                    let doc = extract_document(&chain, &file.name, &file.hash, &file.bytes);
                    (file.name, doc)
                })
                .collect()
        })
        .await
        .map_err(|e| internal(format!("extraction task failed: {}", e)))?;

    let mut session = lock_session(&state)?;
    plan.commit(&mut session, &mut report, extracted);
    tracing::info!(
        searchable = report.searchable(),
        skipped = report.skipped(),
        documents = session.len(),
        "upload processed"
    );

    Ok(Json(report))
}

// ============ DELETE /documents ============

#[derive(Serialize)]
struct ClearResponse {
    removed: usize,
}

async fn handle_clear(State(state): State<AppState>) -> Result<Json<ClearResponse>, AppError> {
    let mut session = lock_session(&state)?;
    let removed = session.len();
    session.clear();
    tracing::info!(removed, "session cleared");
    Ok(Json(ClearResponse { removed }))
}

// ============ DELETE /documents/{name} ============

#[derive(Serialize)]
struct RemoveResponse {
    removed: String,
}

async fn handle_remove(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RemoveResponse>, AppError> {
    let mut session = lock_session(&state)?;
    if !session.remove(&name) {
        return Err(not_found(format!("no document named: {}", name)));
    }
    Ok(Json(RemoveResponse { removed: name }))
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    before: Option<usize>,
    after: Option<usize>,
    max_per_document: Option<usize>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let params = state
        .config
        .search
        .params(req.before, req.after, req.max_per_document);
    if params.max_per_document == 0 {
        return Err(bad_request("max_per_document must be >= 1"));
    }

    let session = lock_session(&state)?;
    let response = search_session(&session, &req.query, &params);
    tracing::debug!(
        keywords = response.keywords.len(),
        results = response.results.len(),
        "search"
    );
    Ok(Json(response))
}
