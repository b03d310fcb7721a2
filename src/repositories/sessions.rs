use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ExamSession;
use crate::db::types::SessionStatus;

pub(crate) const COLUMNS: &str = "id, student_id, exam_id, start_time, end_time, status, score";

/// Completed session joined with its student, for the admin result listing.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamResultRow {
    pub(crate) session_id: i64,
    pub(crate) student_id: i64,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) score: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RecentSessionRow {
    pub(crate) session_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) exam_title: String,
    pub(crate) student_id: i64,
    pub(crate) username: String,
    pub(crate) status: SessionStatus,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) score: Option<i32>,
    pub(crate) total_marks: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StudentResultRow {
    pub(crate) session_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) exam_title: String,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) score: i32,
    pub(crate) total_marks: i64,
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!("SELECT {COLUMNS} FROM exam_sessions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Row-locks the session until the surrounding transaction ends.
pub(crate) async fn lock_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_pair(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: i64,
    exam_id: i64,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions WHERE student_id = $1 AND exam_id = $2"
    ))
    .bind(student_id)
    .bind(exam_id)
    .fetch_optional(executor)
    .await
}

/// Serializes session starts for one (exam, student) pair until commit.
pub(crate) async fn acquire_pair_lock(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
    student_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1::INT4, $2::INT4)")
        .bind((exam_id & 0x7fff_ffff) as i32)
        .bind((student_id & 0x7fff_ffff) as i32)
        .execute(executor)
        .await?;
    Ok(())
}

/// Returns `None` when a session for the pair already exists.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: i64,
    exam_id: i64,
    now: PrimitiveDateTime,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "INSERT INTO exam_sessions (student_id, exam_id, start_time, status)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT (student_id, exam_id) DO NOTHING
         RETURNING {COLUMNS}"
    ))
    .bind(student_id)
    .bind(exam_id)
    .bind(now)
    .bind(SessionStatus::InProgress)
    .fetch_optional(executor)
    .await
}

/// Completes an in-progress session. Returns `false` when the row was not
/// `in_progress`, in which case nothing changed.
pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
    score: i32,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exam_sessions SET status = $1, end_time = $2, score = $3
         WHERE id = $4 AND status = $5",
    )
    .bind(SessionStatus::Completed)
    .bind(now)
    .bind(score)
    .bind(id)
    .bind(SessionStatus::InProgress)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn list_results_by_exam(
    pool: &PgPool,
    exam_id: i64,
) -> Result<Vec<ExamResultRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamResultRow>(
        "SELECT s.id AS session_id, s.student_id, u.username, u.full_name,
                s.start_time, s.end_time, s.score
         FROM exam_sessions s
         JOIN users u ON u.id = s.student_id
         WHERE s.exam_id = $1 AND s.status = $2 AND s.score IS NOT NULL
         ORDER BY s.score DESC, s.end_time ASC",
    )
    .bind(exam_id)
    .bind(SessionStatus::Completed)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_recent(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<RecentSessionRow>, sqlx::Error> {
    sqlx::query_as::<_, RecentSessionRow>(
        "SELECT s.id AS session_id, s.exam_id, e.title AS exam_title, s.student_id, u.username,
                s.status, s.start_time, s.end_time, s.score,
                (SELECT COALESCE(SUM(q.marks), 0)::BIGINT FROM questions q
                 WHERE q.exam_id = s.exam_id) AS total_marks
         FROM exam_sessions s
         JOIN exams e ON e.id = s.exam_id
         JOIN users u ON u.id = s.student_id
         ORDER BY s.start_time DESC, s.id DESC
         LIMIT $1",
    )
    .bind(limit.clamp(1, 100))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_results_by_student(
    pool: &PgPool,
    student_id: i64,
) -> Result<Vec<StudentResultRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentResultRow>(
        "SELECT s.id AS session_id, s.exam_id, e.title AS exam_title,
                s.start_time, s.end_time, s.score,
                (SELECT COALESCE(SUM(q.marks), 0)::BIGINT FROM questions q
                 WHERE q.exam_id = s.exam_id) AS total_marks
         FROM exam_sessions s
         JOIN exams e ON e.id = s.exam_id
         WHERE s.student_id = $1 AND s.status = $2 AND s.score IS NOT NULL
         ORDER BY s.end_time DESC",
    )
    .bind(student_id)
    .bind(SessionStatus::Completed)
    .fetch_all(pool)
    .await
}
