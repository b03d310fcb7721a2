use sqlx::PgPool;

use crate::db::models::Question;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, question_text, option_a, option_b, option_c, option_d, correct_option, marks";

pub(crate) struct QuestionFields<'a> {
    pub(crate) question_text: &'a str,
    pub(crate) option_a: &'a str,
    pub(crate) option_b: &'a str,
    pub(crate) option_c: &'a str,
    pub(crate) option_d: &'a str,
    pub(crate) correct_option: &'a str,
    pub(crate) marks: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct QuestionStatsRow {
    pub(crate) id: i64,
    pub(crate) question_text: String,
    pub(crate) marks: i32,
    pub(crate) correct_count: i64,
    pub(crate) incorrect_count: i64,
}

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY id"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    exam_id: i64,
    fields: QuestionFields<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            exam_id, question_text, option_a, option_b, option_c, option_d, correct_option, marks
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(exam_id)
    .bind(fields.question_text)
    .bind(fields.option_a)
    .bind(fields.option_b)
    .bind(fields.option_c)
    .bind(fields.option_d)
    .bind(fields.correct_option)
    .bind(fields.marks)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    exam_id: i64,
    question_id: i64,
    fields: QuestionFields<'_>,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            question_text = $1, option_a = $2, option_b = $3, option_c = $4, option_d = $5,
            correct_option = $6, marks = $7
         WHERE id = $8 AND exam_id = $9
         RETURNING {COLUMNS}",
    ))
    .bind(fields.question_text)
    .bind(fields.option_a)
    .bind(fields.option_b)
    .bind(fields.option_c)
    .bind(fields.option_d)
    .bind(fields.correct_option)
    .bind(fields.marks)
    .bind(question_id)
    .bind(exam_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(
    pool: &PgPool,
    exam_id: i64,
    question_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1 AND exam_id = $2")
        .bind(question_id)
        .bind(exam_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Per-question answer tallies. Answer rows only exist for completed sessions;
/// unanswered questions count toward neither column.
pub(crate) async fn stats_by_exam(
    pool: &PgPool,
    exam_id: i64,
) -> Result<Vec<QuestionStatsRow>, sqlx::Error> {
    sqlx::query_as::<_, QuestionStatsRow>(
        "SELECT q.id, q.question_text, q.marks,
                COUNT(a.id) FILTER (WHERE a.is_correct) AS correct_count,
                COUNT(a.id) FILTER (WHERE NOT a.is_correct) AS incorrect_count
         FROM questions q
         LEFT JOIN student_answers a ON a.question_id = q.id
         WHERE q.exam_id = $1
         GROUP BY q.id
         ORDER BY q.id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
