use sqlx::PgPool;

/// One graded question of a session: the question plus the recorded answer,
/// if the student answered it.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct GradedQuestionRow {
    pub(crate) question_id: i64,
    pub(crate) question_text: String,
    pub(crate) option_a: String,
    pub(crate) option_b: String,
    pub(crate) option_c: String,
    pub(crate) option_d: String,
    pub(crate) correct_option: String,
    pub(crate) marks: i32,
    pub(crate) selected_option: Option<String>,
    pub(crate) is_correct: Option<bool>,
}

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: i64,
    question_id: i64,
    selected_option: &str,
    is_correct: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO student_answers (session_id, question_id, selected_option, is_correct)
         VALUES ($1,$2,$3,$4)",
    )
    .bind(session_id)
    .bind(question_id)
    .bind(selected_option)
    .bind(is_correct)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_graded(
    pool: &PgPool,
    session_id: i64,
    exam_id: i64,
) -> Result<Vec<GradedQuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, GradedQuestionRow>(
        "SELECT q.id AS question_id, q.question_text, q.option_a, q.option_b, q.option_c,
                q.option_d, q.correct_option, q.marks, a.selected_option, a.is_correct
         FROM questions q
         LEFT JOIN student_answers a ON a.question_id = q.id AND a.session_id = $1
         WHERE q.exam_id = $2
         ORDER BY q.id",
    )
    .bind(session_id)
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
