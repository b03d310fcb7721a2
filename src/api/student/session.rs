use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::helpers::{ensure_owner, fetch_exam, fetch_session};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::SessionStatus;
use crate::repositories;
use crate::schemas::exam::{ExamResponse, StudentQuestionResponse};
use crate::schemas::session::{StartExamResponse, TakeExamResponse};
use crate::services::session_lifecycle::{self, remaining_seconds, session_deadline};

pub(super) async fn start_exam(
    CurrentStudent(student): CurrentStudent,
    Path(exam_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StartExamResponse>), ApiError> {
    let started =
        session_lifecycle::start_exam(state.db(), exam_id, student.id, primitive_now_utc())
            .await?;

    let status = if started.reused { StatusCode::OK } else { StatusCode::CREATED };
    let session = started.session;

    Ok((
        status,
        Json(StartExamResponse {
            session_id: session.id,
            exam_id: session.exam_id,
            status: session.status,
            start_time: format_primitive(session.start_time),
            reused: started.reused,
        }),
    ))
}

pub(super) async fn take_exam(
    CurrentStudent(student): CurrentStudent,
    Path(session_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<TakeExamResponse>, ApiError> {
    let session = fetch_session(state.db(), session_id).await?;
    ensure_owner(&session, &student)?;
    if session.status != SessionStatus::InProgress {
        return Err(ApiError::Conflict("Invalid or expired exam session".to_string()));
    }

    let exam = fetch_exam(state.db(), session.exam_id).await?;
    let questions = repositories::questions::list_by_exam(state.db(), exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    if questions.is_empty() {
        return Err(ApiError::Conflict("No questions found for this exam".to_string()));
    }

    let now = primitive_now_utc();
    Ok(Json(TakeExamResponse {
        session_id: session.id,
        status: session.status,
        start_time: format_primitive(session.start_time),
        deadline: format_primitive(session_deadline(&session, &exam)),
        remaining_seconds: remaining_seconds(&session, &exam, now),
        exam: ExamResponse::from(exam),
        questions: questions.into_iter().map(StudentQuestionResponse::from).collect(),
    }))
}
