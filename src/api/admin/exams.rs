use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::helpers::{fetch_exam, total_marks};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamDetailResponse, ExamResponse, QuestionResponse};

pub(super) async fn create_exam(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    validate_payload(&payload)?;

    let start_time = to_primitive_utc(payload.start_time);
    let end_time = to_primitive_utc(payload.end_time);
    if start_time >= end_time {
        return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
    }

    let description = payload.description.as_deref().map(str::trim).filter(|d| !d.is_empty());
    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            title: payload.title.trim(),
            description,
            duration_minutes: payload.duration_minutes,
            start_time,
            end_time,
            created_by: admin.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(exam_id = exam.id, admin_id = admin.id, "Exam created");

    Ok((StatusCode::CREATED, Json(ExamResponse::from(exam))))
}

pub(super) async fn list_exams(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = repositories::exams::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamResponse::from).collect()))
}

pub(super) async fn get_exam(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(exam_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ExamDetailResponse>, ApiError> {
    let exam = fetch_exam(state.db(), exam_id).await?;
    let total_marks = total_marks(state.db(), exam.id).await?;
    let questions = repositories::questions::list_by_exam(state.db(), exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(Json(ExamDetailResponse {
        exam: ExamResponse::from(exam),
        total_marks,
        questions: questions.into_iter().map(QuestionResponse::from).collect(),
    }))
}

pub(super) async fn delete_exam(
    CurrentAdmin(admin): CurrentAdmin,
    Path(exam_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::delete_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(exam_id, admin_id = admin.id, "Exam deleted");
    Ok(StatusCode::NO_CONTENT)
}
