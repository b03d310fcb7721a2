use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::helpers::fetch_exam;
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::repositories::{self, questions::QuestionFields};
use crate::schemas::exam::{QuestionPayload, QuestionResponse};

fn question_fields<'a>(
    payload: &'a QuestionPayload,
    correct_option: &'a str,
) -> QuestionFields<'a> {
    QuestionFields {
        question_text: payload.question_text.trim(),
        option_a: payload.option_a.trim(),
        option_b: payload.option_b.trim(),
        option_c: payload.option_c.trim(),
        option_d: payload.option_d.trim(),
        correct_option,
        marks: payload.marks,
    }
}

fn canonical_option(payload: &QuestionPayload) -> Result<String, ApiError> {
    payload.canonical_correct_option().ok_or_else(|| {
        ApiError::BadRequest("correct_option must be one of a, b, c, d".to_string())
    })
}

pub(super) async fn create_question(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(exam_id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<QuestionPayload>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    validate_payload(&payload)?;
    let correct_option = canonical_option(&payload)?;
    let exam = fetch_exam(state.db(), exam_id).await?;

    let question = repositories::questions::create(
        state.db(),
        exam.id,
        question_fields(&payload, &correct_option),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    tracing::info!(exam_id, question_id = question.id, "Question added");

    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

pub(super) async fn list_questions(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(exam_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let exam = fetch_exam(state.db(), exam_id).await?;
    let questions = repositories::questions::list_by_exam(state.db(), exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from).collect()))
}

pub(super) async fn update_question(
    CurrentAdmin(_admin): CurrentAdmin,
    Path((exam_id, question_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    Json(payload): Json<QuestionPayload>,
) -> Result<Json<QuestionResponse>, ApiError> {
    validate_payload(&payload)?;
    let correct_option = canonical_option(&payload)?;

    let question = repositories::questions::update(
        state.db(),
        exam_id,
        question_id,
        question_fields(&payload, &correct_option),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    tracing::info!(exam_id, question_id, "Question updated");

    Ok(Json(QuestionResponse::from(question)))
}

pub(super) async fn delete_question(
    CurrentAdmin(_admin): CurrentAdmin,
    Path((exam_id, question_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::questions::delete(state.db(), exam_id, question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    tracing::info!(exam_id, question_id, "Question deleted");
    Ok(StatusCode::NO_CONTENT)
}
