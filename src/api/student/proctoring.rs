use axum::{extract::State, Json};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::helpers::{ensure_owner, fetch_session};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::schemas::proctoring::{ProctoringLogRequest, ProctoringLogResponse};
use crate::services::proctoring::{self, ProctoringEvent, ScreenshotDecision};

const PROCTORING_RATE_WINDOW_SECONDS: u64 = 60;

pub(super) async fn log_event(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<ProctoringLogRequest>,
) -> Result<Json<ProctoringLogResponse>, ApiError> {
    let session_id =
        payload.session_id.ok_or_else(|| ApiError::BadRequest("Missing session ID".to_string()))?;
    validate_payload(&payload)?;
    let log_type = payload.log_type.trim().to_ascii_lowercase();
    if log_type.is_empty() {
        return Err(ApiError::BadRequest("log_type must not be blank".to_string()));
    }

    let session = fetch_session(state.db(), session_id).await?;
    ensure_owner(&session, &student)?;

    let rate_key = format!("rl:proctoring:{session_id}");
    let limit = state.settings().proctoring().events_per_minute;
    if !state.redis().allow(&rate_key, limit, PROCTORING_RATE_WINDOW_SECONDS).await {
        return Err(ApiError::TooManyRequests("Proctoring event rate limit exceeded"));
    }

    let recorded = proctoring::record_event(
        state.db(),
        state.settings(),
        ProctoringEvent {
            session_id,
            log_type: &log_type,
            details: payload.details.as_deref(),
            screenshot: payload.screenshot.as_deref(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record proctoring event"))?;

    Ok(Json(ProctoringLogResponse {
        status: "success",
        log_id: recorded.log_id,
        screenshot_stored: matches!(recorded.screenshot, ScreenshotDecision::Stored { .. }),
        screenshot_omitted: matches!(recorded.screenshot, ScreenshotDecision::Omitted { .. }),
    }))
}
