use super::state::AppState;
use super::store::TrackingRecord;
use crate::progress::progress_percent;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Header carrying the authenticated viewer
pub const USER_HEADER: &str = "x-user-id";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of a progress reading, as sent by the progress reporter
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    pub video_id: Option<String>,
    pub current_time: Option<f64>,
    pub duration: Option<f64>,
}

impl TrackingRequest {
    /// Fields of a well-formed request; `None` if any is missing or the id is empty
    fn validated(self) -> Option<(String, f64, f64)> {
        let video_id = self.video_id.filter(|id| !id.is_empty())?;
        Some((video_id, self.current_time?, self.duration?))
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/video-tracking
/// Store one progress reading for the calling viewer
pub async fn save_tracking(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(user_id) = user_id(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    };

    let parsed = serde_json::from_slice::<TrackingRequest>(&body)
        .ok()
        .and_then(TrackingRequest::validated);

    let Some((video_id, current_time, duration)) = parsed else {
        warn!("Rejected malformed tracking body from {}", user_id);
        return error_response(StatusCode::BAD_REQUEST, "Invalid request data");
    };

    let record = TrackingRecord {
        user_id,
        video_id,
        current_time,
        duration,
        watched_percentage: progress_percent(Some(current_time), Some(duration)),
        recorded_at: Utc::now(),
    };

    info!(
        "Tracking {} for {}: {:.1}%",
        record.video_id, record.user_id, record.watched_percentage
    );

    if let Err(e) = state.store.insert(record).await {
        error!("Error saving video tracking: {:#}", e);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save tracking data",
        );
    }

    (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
}

/// GET /api/video-tracking/:video_id
/// Progress readings of the calling viewer for one video
pub async fn get_tracking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(video_id): Path<String>,
) -> Response {
    let Some(user_id) = user_id(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    };

    match state.store.list(&user_id, &video_id).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            error!("Failed to load tracking for {}: {:#}", video_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load tracking data",
            )
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
