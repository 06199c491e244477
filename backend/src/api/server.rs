//! HTTP server for the BOM summary API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/convert`    | Upload a BOM sheet (CSV or workbook) |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |
//!
//! `/api/convert` takes a multipart `file` field and optional query
//! overrides (`orderName`, `orderNumber`, `sheet`, `headerRow`).

use axum::{
    extract::{Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::types::{error_response, ConvertQuery, ConvertResponse};
use crate::config::ConvertOptions;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::transform::pipeline::{convert_bytes, ConversionResult};

type ApiError = (StatusCode, Json<Value>);

/// Build the router around base options.
pub fn router(options: ConvertOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/convert", post(convert_upload))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(options))
}

/// Start the HTTP server
pub async fn start_server(port: u16, options: ConvertOptions) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(options);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 BOM summary server running on http://localhost:{}", port);
    println!("   POST /api/convert - Upload BOM sheet");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "bomsummary",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "convert": "POST /api/convert",
            "logs": "GET /api/logs (SSE)"
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
        // lagged receiver
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint
async fn convert_upload(
    State(base): State<Arc<ConvertOptions>>,
    Query(query): Query<ConvertQuery>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(ServerError::BadRequest(format!("Multipart error: {}", e))))?
    {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("upload.csv").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| api_error(ServerError::BadRequest(format!("Read error: {}", e))))?;
            upload = Some((name, bytes.to_vec()));
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| api_error(ServerError::BadRequest("No file provided".to_string())))?;

    log_info(format!("📄 New upload: {} ({} bytes)", file_name, bytes.len()));

    let options = apply_query(&base, query);
    let result = run_conversion(file_name.clone(), bytes, options).await.map_err(|e| {
        log_error(format!("Conversion failed: {}", e));
        api_error(e)
    })?;

    log_success(format!("{} items converted", result.summaries.len()));

    Ok(Json(ConvertResponse::new(result, Some(file_name))))
}

/// Conversion is CPU-bound; keep it off the async workers.
async fn run_conversion(file_name: String, bytes: Vec<u8>, options: ConvertOptions) -> ServerResult<ConversionResult> {
    let result = tokio::task::spawn_blocking(move || convert_bytes(&file_name, &bytes, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
    Ok(result)
}

fn apply_query(base: &ConvertOptions, query: ConvertQuery) -> ConvertOptions {
    let mut options = base.clone();
    if let Some(name) = query.order_name {
        options.order_name = name;
    }
    if let Some(number) = query.order_number {
        options.order_number = number;
    }
    if let Some(sheet) = query.sheet {
        options.sheet_name = Some(sheet);
    }
    if query.header_row.is_some() {
        options.header_row = query.header_row;
    }
    options
}

fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Sheet(_))
        | ServerError::Pipeline(PipelineError::Column(_))
        | ServerError::Pipeline(PipelineError::EmptyInput) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: ServerError) -> ApiError {
    (status_for(&err), Json(error_response(&err.to_string())))
}
