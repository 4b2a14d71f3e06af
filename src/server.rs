//! HTTP API server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/analyze` | Multipart upload (`file` field) → six extracted fields |
//! | `GET`  | `/api/users` | All name records, newest first |
//! | `POST` | `/api/users` | Add a name (`{"name": "..."}`), returns the refreshed list |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Every error response is a flat JSON object:
//!
//! ```json
//! { "error": "No file provided" }
//! ```
//!
//! Extraction itself never fails: a broken remote extractor silently
//! degrades to the heuristic segmenter. Only a missing `file` field (400),
//! an oversized body (413) or an unreadable request (500) surface as errors.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a separately hosted
//! UI can call the API.

use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::extractor::ExtractionService;
use crate::migrate;
use crate::models::{Document, ExtractionResult, NameRecord};
use crate::records::{NameRecords, SqliteRecordStore, Submission};

/// Multipart field carrying the uploaded document.
const FILE_FIELD: &str = "file";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub extraction: Arc<ExtractionService>,
    pub records: NameRecords,
}

/// Build the router with all routes and middleware.
///
/// `max_upload_bytes` bounds every request body; larger uploads are
/// rejected with 413 before extraction runs.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/analyze", post(handle_analyze))
        .route("/api/users", get(handle_list_users).post(handle_add_user))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Opens the database (creating the schema if needed), resolves the
/// remote extractor credential once, binds to `[server].bind` and serves
/// until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;

    let state = AppState {
        extraction: Arc::new(ExtractionService::from_config(&config.extractor)),
        records: NameRecords::new(Arc::new(SqliteRecordStore::new(pool))),
    };
    let app = build_router(state, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    ApiError {
        status,
        message: message.into(),
    }
}

fn no_file() -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "No file provided")
}

fn processing_failed() -> ApiError {
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to process the research paper",
    )
}

/// Maps a multipart read failure. Body-limit hits keep their 413; anything
/// else is an unclassified failure.
fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return api_error(StatusCode::PAYLOAD_TOO_LARGE, "File too large");
    }
    error!("Error processing research paper: {}", err.body_text());
    processing_failed()
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/analyze ============

/// Handler for `POST /api/analyze`.
///
/// Reads the `file` field, decodes it as text and runs the extraction
/// chain. The response is always the six fields, whichever tier produced
/// them.
async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        error!("Error processing research paper: {}", e.body_text());
        processing_failed()
    })?;

    let bytes = read_file_field(&mut multipart).await?.ok_or_else(no_file)?;

    let document = Document::from_bytes(&bytes);
    let analysis = state.extraction.analyze(&document.text).await;
    info!(
        source = analysis.source.as_str(),
        bytes = bytes.len(),
        "analyzed document"
    );

    Ok(Json(analysis.result))
}

/// Returns the contents of the first `file` field, skipping any others.
///
/// The field must be a file part. A plain text value under that name is
/// an unreadable upload, not a missing one.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<Bytes>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if field.file_name().is_none() {
            error!("Error processing research paper: `{}` is not a file part", FILE_FIELD);
            return Err(processing_failed());
        }
        return field.bytes().await.map(Some).map_err(multipart_error);
    }
    Ok(None)
}

// ============ /api/users ============

async fn handle_list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<NameRecord>>, ApiError> {
    let users = state
        .records
        .list()
        .await
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load users"))?;
    Ok(Json(users))
}

/// Request body for `POST /api/users`.
#[derive(Deserialize)]
pub struct NewUser {
    pub name: String,
}

/// Handler for `POST /api/users`.
///
/// Returns `204` without touching the store for a whitespace-only name,
/// otherwise `201` with the refreshed list.
async fn handle_add_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(new_user) =
        payload.map_err(|_| api_error(StatusCode::BAD_REQUEST, "name is required"))?;

    let submission = state.records.submit(&new_user.name).await.map_err(|_| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to insert user.")
    })?;

    Ok(match submission {
        Submission::Skipped => StatusCode::NO_CONTENT.into_response(),
        Submission::Added(users) => (StatusCode::CREATED, Json(users)).into_response(),
    })
}
