use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::db::MeasurementStore;
use crate::import_error::ImportError;
use crate::models::{ImportResult, ImportStrategy, ParseResult};
use crate::services::ImportService;

#[derive(Clone)]
pub struct AppState {
    pub import_service: ImportService,
    pub store: Arc<dyn MeasurementStore>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitParams {
    pub file_name: String,
    pub strategy: ImportStrategy,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn create_router(state: AppState) -> Router {
    // Bodies one byte over the limit still reach the upload check
    let body_limit = usize::try_from(state.import_service.max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(1);

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/imports/preview", post(preview_import))
        .route("/imports/commit", post(commit_import))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

fn status_for(err: &ImportError) -> StatusCode {
    match err {
        ImportError::InvalidFile(_) => StatusCode::BAD_REQUEST,
        ImportError::InvalidFormat { .. }
        | ImportError::EmptyInput
        | ImportError::Transform { .. }
        | ImportError::Csv(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ImportError::ValidationBlocked { .. } => StatusCode::CONFLICT,
        ImportError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: ImportError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("Import failed: {}", err);
    } else {
        warn!("Import rejected: {}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.kind().to_string(),
            message: err.to_string(),
        }),
    )
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[instrument(skip(state, body), fields(file_name = %params.file_name, size = body.len()))]
async fn preview_import(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
    body: Bytes,
) -> Result<Json<ParseResult>, ApiError> {
    let parsed = state
        .import_service
        .parse_upload(&params.file_name, &body)
        .map_err(error_response)?;

    info!(
        "Previewed {}: {} records, {} duplicate dates, valid: {}",
        params.file_name,
        parsed.canonical_records.len(),
        parsed.duplicate_groups.len(),
        parsed.validation.is_valid
    );
    Ok(Json(parsed))
}

#[instrument(skip(state, body), fields(file_name = %params.file_name, strategy = %params.strategy))]
async fn commit_import(
    State(state): State<AppState>,
    Query(params): Query<CommitParams>,
    body: Bytes,
) -> Result<Json<ImportResult>, ApiError> {
    let parsed = state
        .import_service
        .parse_upload(&params.file_name, &body)
        .map_err(error_response)?;

    let result = state
        .import_service
        .commit_import(&parsed, params.strategy, state.store.as_ref())
        .await
        .map_err(error_response)?;

    info!(
        "Committed {}: {} stored, {} failed",
        params.file_name, result.success_count, result.failure_count
    );
    Ok(Json(result))
}
