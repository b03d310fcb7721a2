use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::helpers::{fetch_exam, fetch_session, session_result, total_marks};
use crate::core::state::AppState;
use crate::core::time::format_primitive;
use crate::repositories;
use crate::schemas::exam::{ExamResponse, ExamResultEntry, ExamResultsResponse};
use crate::schemas::proctoring::{ProctoringLogEntry, ProctoringLogsResponse};
use crate::schemas::session::{AdminDashboardResponse, RecentSessionEntry, SessionResultResponse};
use crate::services::exam_stats::{exam_stats, QuestionStats};
use crate::services::scoring::percentage;

const RECENT_SESSIONS_LIMIT: i64 = 10;

pub(super) async fn dashboard(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardResponse>, ApiError> {
    let exams = repositories::exams::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;
    let recent = repositories::sessions::list_recent(state.db(), RECENT_SESSIONS_LIMIT)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list recent sessions"))?;

    Ok(Json(AdminDashboardResponse {
        exams: exams.into_iter().map(ExamResponse::from).collect(),
        recent_sessions: recent.into_iter().map(RecentSessionEntry::from).collect(),
    }))
}

pub(super) async fn exam_results(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(exam_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ExamResultsResponse>, ApiError> {
    let exam = fetch_exam(state.db(), exam_id).await?;
    let total_marks = total_marks(state.db(), exam.id).await?;

    let rows = repositories::sessions::list_results_by_exam(state.db(), exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam results"))?;
    let question_rows = repositories::questions::stats_by_exam(state.db(), exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question statistics"))?;

    let scores: Vec<i32> = rows.iter().map(|row| row.score).collect();
    let stats = exam_stats(&scores, total_marks);

    let results = rows
        .into_iter()
        .map(|row| ExamResultEntry {
            session_id: row.session_id,
            student_id: row.student_id,
            username: row.username,
            full_name: row.full_name,
            start_time: format_primitive(row.start_time),
            end_time: row.end_time.map(format_primitive),
            score: row.score,
            percentage: percentage(i64::from(row.score), total_marks),
        })
        .collect();

    Ok(Json(ExamResultsResponse {
        exam: ExamResponse::from(exam),
        total_marks,
        results,
        stats,
        question_stats: question_rows.into_iter().map(QuestionStats::from).collect(),
    }))
}

pub(super) async fn session_detail(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(session_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<SessionResultResponse>, ApiError> {
    let session = fetch_session(state.db(), session_id).await?;
    let student = repositories::users::find_by_id(state.db(), session.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;

    Ok(Json(session_result(state.db(), session, student).await?))
}

pub(super) async fn proctoring_logs(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(session_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProctoringLogsResponse>, ApiError> {
    let session = fetch_session(state.db(), session_id).await?;

    let logs = repositories::proctoring_logs::list_by_session(state.db(), session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch proctoring logs"))?;
    let violations = repositories::proctoring_logs::violations_summary(state.db(), session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to summarize violations"))?;
    let critical_violations =
        repositories::proctoring_logs::count_critical(state.db(), session.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count critical violations"))?;

    Ok(Json(ProctoringLogsResponse {
        session_id: session.id,
        student_id: session.student_id,
        exam_id: session.exam_id,
        critical_violations,
        violations,
        logs: logs.into_iter().map(ProctoringLogEntry::from).collect(),
    }))
}
