//! HTTP Server for the metaboflow API.
//!
//! Request parameters travel in headers (`id`, `filename`); transform
//! results come back as a zip attachment.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                                  |
//! |--------|------------------------|----------------------------------------------|
//! | GET    | `/health`              | Health check                                 |
//! | POST   | `/upload`              | Upload an xlsx file (multipart field `file`) |
//! | GET    | `/filter_compoundID`   | Split by compound class, zip of 3 files      |
//! | GET    | `/roundoff_retention`  | Round retention time, zip of 1 file          |
//! | GET    | `/find_mean`           | Mean per rounded retention time, zip         |
//! | GET    | `/status`              | Which steps have run for a file              |
//! | GET    | `/logs`                | SSE stream for real-time logs                |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderName, Method},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, log_warning, LOG_BROADCASTER};
use super::types::{StatusResponse, UPLOAD_FAILED, UPLOAD_OK};
use crate::bundle::{zip_files, BUNDLE_NAME};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult, WorkflowError};
use crate::validation::is_allowed_extension;
use crate::workflow::{Step, Workflow};

/// Header carrying the caller id.
pub const ID_HEADER: &str = "id";
/// Header carrying the original filename.
pub const FILENAME_HEADER: &str = "filename";

/// Shared state for all handlers.
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    pub workflow: Workflow,
}

impl AppState {
    /// Build the state, creating the storage directories if needed.
    pub fn new(config: ServerConfig) -> Result<Self, WorkflowError> {
        let workflow = Workflow::new(config.storage.clone())?;
        Ok(Self { config, workflow })
    }
}

/// Build the router with all routes and layers.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(ID_HEADER),
            HeaderName::from_static(FILENAME_HEADER),
        ])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/filter_compoundID", get(filter_compound_id))
        .route("/roundoff_retention", get(roundoff_retention))
        .route("/find_mean", get(find_mean))
        .route("/status", get(status))
        .route("/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let state = Arc::new(AppState::new(config)?);

    println!("🚀 Metaboflow server running on http://localhost:{}", port);
    println!("   POST /upload              - Upload xlsx file");
    println!("   GET  /filter_compoundID   - Split PC / LPC / plasmalogen");
    println!("   GET  /roundoff_retention  - Round retention time");
    println!("   GET  /find_mean           - Mean per retention time");
    println!("   GET  /status              - Workflow progress");
    println!("   GET  /logs                - SSE log stream");
    println!(
        "📁 Uploads: {}  Outputs: {}",
        state.config.storage.upload_dir.display(),
        state.config.storage.download_dir.display()
    );
    println!();

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "metaboflow",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /upload",
            "filter": "GET /filter_compoundID",
            "round": "GET /roundoff_retention",
            "mean": "GET /find_mean",
            "status": "GET /status",
            "logs": "GET /logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint
async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ServerResult<&'static str> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ServerError::BadRequest(UPLOAD_FAILED.to_string()))?
    {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ServerError::BadRequest(UPLOAD_FAILED.to_string()))?;
            file = Some((name, bytes.to_vec()));
        }
    }

    let (filename, bytes) = file.ok_or_else(|| ServerError::BadRequest(UPLOAD_FAILED.to_string()))?;
    if !is_allowed_extension(&filename) {
        log_warning(format!("Rejected upload with invalid extension: {}", filename));
        return Err(WorkflowError::InvalidExtension(filename).into());
    }
    let caller = required_header(&headers, ID_HEADER)?;

    log_info(format!("📄 Upload: {} ({} bytes)", filename, bytes.len()));

    tokio::task::spawn_blocking(move || state.workflow.upload(&caller, &filename, &bytes))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(UPLOAD_OK)
}

async fn filter_compound_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    run_step(state, &headers, Step::Filter).await
}

async fn roundoff_retention(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    run_step(state, &headers, Step::Round).await
}

async fn find_mean(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    run_step(state, &headers, Step::Mean).await
}

/// Workflow progress for the `id` + `filename` headers.
async fn status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ServerResult<Json<StatusResponse>> {
    let caller = required_header(&headers, ID_HEADER)?;
    let filename = required_header(&headers, FILENAME_HEADER)?;

    let status = state.workflow.status(&caller, &filename)?;
    Ok(Json(StatusResponse { caller, status }))
}

/// Run a step on a blocking thread and zip its outputs.
async fn run_step(state: Arc<AppState>, headers: &HeaderMap, step: Step) -> ServerResult<Response> {
    let caller = required_header(headers, ID_HEADER)?;
    let filename = required_header(headers, FILENAME_HEADER)?;

    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, WorkflowError> {
        let output = state.workflow.run(step, &caller, &filename)?;
        Ok(zip_files(&output.files)?)
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))?
    .map_err(|error| ServerError::Step { step, error })?;

    Ok(zip_response(bytes))
}

fn zip_response(bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", BUNDLE_NAME),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn required_header(headers: &HeaderMap, name: &str) -> ServerResult<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ServerError::BadRequest(format!("Missing header: {}", name)))
}
