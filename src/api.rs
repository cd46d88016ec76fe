use crate::config::{ApiConfig, UploadConfig};
use crate::error::{ErrorBody, PredictError};
use crate::object_store::ObjectStore;
use crate::prediction::PredictionSource;
use crate::record_store::{PredictionRecord, RecordStore};
use crate::upload::StagedUpload;
use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Multipart field name carrying the image
const PHOTO_FIELD: &str = "photo";

/// Slack on top of the file ceiling for multipart framing overhead
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub object_store: Arc<ObjectStore>,
    pub record_store: Arc<RecordStore>,
    pub predictor: Arc<dyn PredictionSource>,
    pub upload: UploadConfig,
}

/// Success response for a prediction request
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub message: String,
    pub data: PredictionRecord,
}

/// Create the API router
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = if config.cors_enabled {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    let body_limit = state.upload.max_size_bytes + BODY_LIMIT_OVERHEAD;

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/eye-disease/predict", post(predict))
        .route("/eye-disease/predictions/:id", get(get_prediction))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sightsafe-predict"
    }))
}

/// Readiness check endpoint
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    // Check database connectivity
    match sqlx::query("SELECT 1")
        .fetch_one(state.record_store.pool())
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "database": "connected"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "database": "disconnected",
                "error": e.to_string()
            })),
        ),
    }
}

/// Run one upload through the pipeline: validate, stage, persist the image,
/// obtain a prediction, record it, and return the stored record.
#[instrument(skip(state, multipart))]
async fn predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PredictResponse>, PredictError> {
    let (file_name, data) = extract_photo(multipart).await?;

    // Staged copy is removed when the guard drops, on every exit path
    let staged = StagedUpload::stage(&state.upload, &file_name, &data).await?;

    let key = state
        .object_store
        .put_image(&staged)
        .await
        .map_err(PredictError::StoreUnavailable)?;
    let image_url = state.object_store.public_url(&key);

    let prediction = state
        .predictor
        .predict(&data)
        .await
        .map_err(|e| PredictError::StoreUnavailable(e.context("prediction source failed")))?;

    let record = state
        .record_store
        .insert_prediction(&prediction, &image_url)
        .await
        .map_err(PredictError::RecordUnavailable)?;

    info!(record_id = %record.id, image_url = %image_url, "Prediction stored");

    Ok(Json(PredictResponse {
        message: "Model is predicted successfully.".to_string(),
        data: record,
    }))
}

/// Pull the single `photo` field out of the multipart body
async fn extract_photo(mut multipart: Multipart) -> Result<(String, Vec<u8>), PredictError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PredictError::ValidationFailed(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| PredictError::ValidationFailed("photo field has no filename".into()))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| PredictError::ValidationFailed(format!("failed to read upload: {e}")))?;

        return Ok((file_name, data.to_vec()));
    }

    Err(PredictError::InputMissing)
}

/// Get a stored prediction record by ID
#[instrument(skip(state))]
async fn get_prediction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PredictionRecord>, (StatusCode, Json<ErrorBody>)> {
    let record = state.record_store.get_prediction(id).await.map_err(|e| {
        error!(error = %e, "Failed to get prediction record");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                message: "Failed to get prediction.".to_string(),
            }),
        )
    })?;

    match record {
        Some(r) => Ok(Json(r)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                message: "Prediction not found.".to_string(),
            }),
        )),
    }
}

/// Start the HTTP API server
pub async fn start_api_server(state: AppState, config: &ApiConfig) -> Result<()> {
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting prediction API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .await
        .context("API server error")?;

    Ok(())
}
