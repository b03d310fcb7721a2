use sqlx::PgPool;

use crate::api::errors::ApiError;
use crate::core::time::format_primitive;
use crate::db::models::{Exam, ExamSession, User};
use crate::repositories;
use crate::schemas::exam::ExamResponse;
use crate::schemas::session::{GradedQuestionEntry, SessionResultResponse};
use crate::schemas::user::UserResponse;
use crate::services::scoring::percentage;

pub(crate) async fn fetch_exam(pool: &PgPool, exam_id: i64) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(pool, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

pub(crate) async fn fetch_session(pool: &PgPool, session_id: i64) -> Result<ExamSession, ApiError> {
    repositories::sessions::find_by_id(pool, session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

pub(crate) fn ensure_owner(session: &ExamSession, user: &User) -> Result<(), ApiError> {
    if session.student_id == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("You do not have access to this session"))
    }
}

pub(crate) async fn total_marks(pool: &PgPool, exam_id: i64) -> Result<i64, ApiError> {
    repositories::exams::total_marks(pool, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute total marks"))
}

/// Graded view of a session: every question of the exam with the recorded
/// answer, the raw score and its percentage.
pub(crate) async fn session_result(
    pool: &PgPool,
    session: ExamSession,
    student: Option<User>,
) -> Result<SessionResultResponse, ApiError> {
    let exam = fetch_exam(pool, session.exam_id).await?;
    let total_marks = total_marks(pool, exam.id).await?;
    let answers = repositories::answers::list_graded(pool, session.id, exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;

    Ok(SessionResultResponse {
        session_id: session.id,
        status: session.status,
        start_time: format_primitive(session.start_time),
        end_time: session.end_time.map(format_primitive),
        score: session.score,
        total_marks,
        percentage: session.score.map(|score| percentage(i64::from(score), total_marks)),
        exam: ExamResponse::from(exam),
        student: student.map(UserResponse::from),
        answers: answers.into_iter().map(GradedQuestionEntry::from).collect(),
    })
}
