use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{ProctoringLog, ViolationSummary};

pub(crate) const COLUMNS: &str = "\
    id, session_id, log_type, details, screenshot, screenshot_sha256, screenshot_omitted, \
    timestamp";

pub(crate) struct NewLog<'a> {
    pub(crate) session_id: i64,
    pub(crate) log_type: &'a str,
    pub(crate) details: Option<&'a str>,
    pub(crate) screenshot: Option<&'a str>,
    pub(crate) screenshot_sha256: Option<&'a str>,
    pub(crate) screenshot_omitted: bool,
    pub(crate) timestamp: PrimitiveDateTime,
}

pub(crate) async fn append(
    executor: impl sqlx::PgExecutor<'_>,
    log: NewLog<'_>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO proctoring_logs (
            session_id, log_type, details, screenshot, screenshot_sha256, screenshot_omitted,
            timestamp
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)
        RETURNING id",
    )
    .bind(log.session_id)
    .bind(log.log_type)
    .bind(log.details)
    .bind(log.screenshot)
    .bind(log.screenshot_sha256)
    .bind(log.screenshot_omitted)
    .bind(log.timestamp)
    .fetch_one(executor)
    .await
}

pub(crate) async fn insert_critical(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: i64,
    violation_type: &str,
    details: Option<&str>,
    timestamp: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO critical_violations (session_id, violation_type, details, timestamp)
         VALUES ($1,$2,$3,$4)",
    )
    .bind(session_id)
    .bind(violation_type)
    .bind(details)
    .bind(timestamp)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_session(
    pool: &PgPool,
    session_id: i64,
) -> Result<Vec<ProctoringLog>, sqlx::Error> {
    sqlx::query_as::<_, ProctoringLog>(&format!(
        "SELECT {COLUMNS} FROM proctoring_logs WHERE session_id = $1
         ORDER BY timestamp DESC, id DESC"
    ))
    .bind(session_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_critical(pool: &PgPool, session_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM critical_violations WHERE session_id = $1")
        .bind(session_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn violations_summary(
    pool: &PgPool,
    session_id: i64,
) -> Result<ViolationSummary, sqlx::Error> {
    sqlx::query_as::<_, ViolationSummary>(
        "SELECT
            COUNT(*) FILTER (WHERE log_type = 'multiple_faces') AS multiple_faces,
            COUNT(*) FILTER (WHERE log_type = 'face_missing') AS face_missing,
            COUNT(*) FILTER (WHERE log_type = 'tab_switch') AS tab_switch,
            COUNT(*) FILTER (WHERE log_type = 'phone_usage_suspected') AS phone_usage_suspected,
            COUNT(*) FILTER (WHERE log_type = 'serious_violation') AS serious_violation,
            COUNT(*) FILTER (WHERE log_type IN (
                'multiple_faces', 'face_missing', 'tab_switch', 'phone_usage_suspected',
                'serious_violation'
            )) AS total
         FROM proctoring_logs
         WHERE session_id = $1",
    )
    .bind(session_id)
    .fetch_one(pool)
    .await
}
