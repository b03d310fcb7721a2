use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Exam;

pub(crate) const COLUMNS: &str = "\
    id, title, description, duration_minutes, start_time, end_time, created_by, \
    created_at, updated_at";

pub(crate) struct CreateExam<'a> {
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) created_by: i64,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            title, description, duration_minutes, start_time, end_time, created_by,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.duration_minutes)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams ORDER BY start_time DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Exams whose window contains `now`, bounds inclusive.
pub(crate) async fn list_active(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams
         WHERE start_time <= $1 AND end_time >= $1
         ORDER BY end_time ASC, id ASC"
    ))
    .bind(now)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_upcoming(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exams WHERE start_time > $1")
        .bind(now)
        .fetch_one(pool)
        .await
}

pub(crate) async fn total_marks(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(SUM(marks), 0)::BIGINT FROM questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
