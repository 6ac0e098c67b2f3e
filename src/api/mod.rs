use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
};
use serde_json::{Value, json};

use crate::{
    TrailcastError, VERSION,
    cache::TtlCache,
    models::GeologyZone,
    report::{TrailReport, TrailReportService, ZoneReport},
    trail::ZoneMatrixEntry,
    weather,
};

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TrailReportService>,
    pub cache: Arc<dyn TtlCache>,
}

/// Maps service failures onto HTTP status codes
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.downcast_ref::<TrailcastError>() {
            Some(err @ TrailcastError::UnknownZone { .. }) => (StatusCode::NOT_FOUND, err.user_message()),
            Some(err @ TrailcastError::Api { .. }) => (StatusCode::BAD_GATEWAY, err.user_message()),
            Some(err @ TrailcastError::Validation { .. }) => (StatusCode::BAD_REQUEST, err.user_message()),
            Some(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.user_message()),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = ?self.0, "Request failed");
        } else {
            tracing::debug!(%status, error = %self.0, "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/zones", get(get_zones))
        .route("/zones/{key}", get(get_zone_report))
        .route("/report", get(get_report))
        .route("/matrix", get(get_matrix))
        .route("/cache/zones/{key}", delete(invalidate_zone_cache))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

async fn get_zones(State(state): State<AppState>) -> Json<Vec<GeologyZone>> {
    Json(state.service.zones().to_vec())
}

async fn get_report(State(state): State<AppState>) -> Result<Json<TrailReport>, ApiError> {
    Ok(Json(state.service.report().await?))
}

async fn get_zone_report(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ZoneReport>, ApiError> {
    Ok(Json(state.service.zone_report(&key).await?))
}

async fn get_matrix(State(state): State<AppState>) -> Result<Json<Vec<ZoneMatrixEntry>>, ApiError> {
    Ok(Json(state.service.matrix().await?))
}

async fn invalidate_zone_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    let zone = state
        .service
        .zones()
        .iter()
        .find(|z| z.key == key)
        .ok_or_else(|| TrailcastError::unknown_zone(&key))
        .map_err(anyhow::Error::from)?;

    weather::invalidate(state.cache.as_ref(), zone.lat, zone.lon)
        .await
        .map_err(|e| anyhow::Error::from(TrailcastError::cache(e.to_string())))?;
    tracing::info!(zone = %zone.key, "Weather cache cleared");
    Ok(StatusCode::NO_CONTENT)
}
