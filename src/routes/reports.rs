use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::AppError,
    models::Upload,
    services::pipeline::{self, Dashboard},
    AppState,
};

const FILE_FIELD: &str = "file";

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/reports/dashboard", post(dashboard))
        .route("/reports/export", post(export_report))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(cors)
}

/// Pulls the `file` field out of the form; other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let no_file = || AppError::InvalidInput("No file provided".to_string());

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Malformed multipart body: {}", e);
        no_file()
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read upload body: {}", e);
            no_file()
        })?;
        return Ok(Upload { file_name, data });
    }

    Err(no_file())
}

/// Runs a pipeline stage chain on a blocking worker so parsing and drawing
/// stay off the async executor.
async fn run_blocking<T, F>(job: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::Internal(format!("report worker failed: {}", e)))?
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Dashboard>, AppError> {
    let start = std::time::Instant::now();
    let upload = read_upload(multipart).await?;
    tracing::info!("Building dashboard for {} ({}KB)", upload.file_name, upload.data.len() / 1024);

    let dashboard = run_blocking(move || {
        pipeline::build_dashboard(&upload, &state.config.report, state.renderer.as_ref())
    })
    .await?;

    tracing::info!("Dashboard ready in {:?}", start.elapsed());
    Ok(Json(dashboard))
}

async fn export_report(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let start = std::time::Instant::now();
    let upload = read_upload(multipart).await?;
    tracing::info!("Exporting report for {} ({}KB)", upload.file_name, upload.data.len() / 1024);

    let report = run_blocking(move || {
        pipeline::build_report(&upload, &state.config.report, state.renderer.as_ref())
    })
    .await?;

    tracing::info!("Report ready in {:?}", start.elapsed());
    let disposition = format!("attachment; filename=\"{}\"", report.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response())
}
