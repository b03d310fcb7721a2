use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::helpers::{ensure_owner, fetch_session, session_result};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::db::types::SessionStatus;
use crate::schemas::session::{SessionResultResponse, SubmitAnswersRequest, SubmitAnswersResponse};
use crate::services::exam_finalize;

pub(super) async fn submit_exam(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<Json<SubmitAnswersResponse>, ApiError> {
    let session_id =
        payload.session_id.ok_or_else(|| ApiError::BadRequest("Missing session ID".to_string()))?;
    validate_payload(&payload)?;

    let result =
        exam_finalize::submit_answers(state.db(), session_id, Some(student.id), &payload.answers)
            .await?;

    Ok(Json(SubmitAnswersResponse {
        status: "success",
        score: result.percentage,
        obtained_marks: result.obtained_marks,
        total_marks: result.total_marks,
    }))
}

pub(super) async fn view_results(
    CurrentStudent(student): CurrentStudent,
    Path(session_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<SessionResultResponse>, ApiError> {
    let session = fetch_session(state.db(), session_id).await?;
    ensure_owner(&session, &student)?;
    if session.status != SessionStatus::Completed {
        return Err(ApiError::Conflict("Exam session is not completed yet".to_string()));
    }

    Ok(Json(session_result(state.db(), session, None).await?))
}
