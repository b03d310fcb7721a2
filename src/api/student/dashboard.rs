use axum::{extract::State, Json};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::ExamResponse;
use crate::schemas::session::{StudentDashboardResponse, StudentResultEntry};

pub(super) async fn dashboard(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<StudentDashboardResponse>, ApiError> {
    let now = primitive_now_utc();

    let active = repositories::exams::list_active(state.db(), now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list active exams"))?;
    let upcoming_count = repositories::exams::count_upcoming(state.db(), now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count upcoming exams"))?;
    let completed = repositories::sessions::list_results_by_student(state.db(), student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list completed sessions"))?;

    let average_score = (!completed.is_empty()).then(|| {
        let sum: i64 = completed.iter().map(|row| i64::from(row.score)).sum();
        (sum as f64 / completed.len() as f64).round() as i64
    });

    Ok(Json(StudentDashboardResponse {
        active_exams: active.into_iter().map(ExamResponse::from).collect(),
        completed_count: completed.len(),
        upcoming_count,
        average_score,
        completed_sessions: completed.into_iter().map(StudentResultEntry::from).collect(),
    }))
}

pub(super) async fn active_exams(
    CurrentStudent(_student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = repositories::exams::list_active(state.db(), primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list active exams"))?;

    Ok(Json(exams.into_iter().map(ExamResponse::from).collect()))
}
