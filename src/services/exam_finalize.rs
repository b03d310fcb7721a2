use std::collections::HashMap;

use sqlx::{Connection, PgPool};
use thiserror::Error;

use crate::core::{metrics, time::primitive_now_utc};
use crate::db::types::SessionStatus;
use crate::repositories::{self, proctoring_logs::NewLog};
use crate::services::scoring::{score_answers, ScoreOutcome};

#[derive(Debug, Error)]
pub(crate) enum ScoringError {
    #[error("Invalid or already completed session")]
    SessionUnavailable,
    #[error("You do not have access to this session")]
    NotOwner,
    #[error("No questions found for this exam")]
    NoQuestions,
    #[error("score of {0} marks does not fit the session score column")]
    ScoreOutOfRange(i64),
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl ScoringError {
    fn outcome(&self) -> &'static str {
        match self {
            Self::SessionUnavailable => "session_unavailable",
            Self::NotOwner => "forbidden",
            Self::NoQuestions => "no_questions",
            Self::Persistence(_) | Self::ScoreOutOfRange(_) => "error",
        }
    }
}

#[derive(Debug)]
pub(crate) struct SubmissionResult {
    pub(crate) session_id: i64,
    pub(crate) obtained_marks: i64,
    pub(crate) total_marks: i64,
    pub(crate) percentage: f64,
    pub(crate) answered: usize,
}

/// Scores `answers` for `session_id` and completes the session exactly once.
///
/// Answer rows, the session transition and the `exam_end` audit row commit in
/// one transaction holding the session row lock. A failing audit insert is
/// rolled back to its savepoint and does not fail the submission. When
/// `student_id` is given the session must belong to that student.
pub(crate) async fn submit_answers(
    pool: &PgPool,
    session_id: i64,
    student_id: Option<i64>,
    answers: &HashMap<String, String>,
) -> Result<SubmissionResult, ScoringError> {
    let result = finalize(pool, session_id, student_id, answers).await;

    match &result {
        Ok(submission) => {
            metrics::record_submission("success");
            tracing::info!(
                session_id,
                obtained_marks = submission.obtained_marks,
                total_marks = submission.total_marks,
                answered = submission.answered,
                "Exam session completed"
            );
        }
        Err(err @ (ScoringError::Persistence(_) | ScoringError::ScoreOutOfRange(_))) => {
            metrics::record_submission("error");
            tracing::error!(session_id, error = %err, "Failed to persist exam submission");
        }
        Err(err) => {
            metrics::record_submission(err.outcome());
            tracing::info!(session_id, reason = %err, "Exam submission rejected");
        }
    }

    result
}

async fn finalize(
    pool: &PgPool,
    session_id: i64,
    student_id: Option<i64>,
    answers: &HashMap<String, String>,
) -> Result<SubmissionResult, ScoringError> {
    let mut tx = pool.begin().await?;

    let session = repositories::sessions::lock_by_id(&mut *tx, session_id)
        .await?
        .ok_or(ScoringError::SessionUnavailable)?;

    if let Some(student_id) = student_id {
        if session.student_id != student_id {
            return Err(ScoringError::NotOwner);
        }
    }
    if session.status != SessionStatus::InProgress {
        return Err(ScoringError::SessionUnavailable);
    }

    let questions = repositories::questions::list_by_exam(&mut *tx, session.exam_id).await?;
    if questions.is_empty() {
        return Err(ScoringError::NoQuestions);
    }

    let outcome = score_answers(&questions, answers);
    let now = primitive_now_utc();

    for answer in &outcome.answers {
        repositories::answers::insert(
            &mut *tx,
            session.id,
            answer.question_id,
            &answer.selected_option,
            answer.is_correct,
        )
        .await?;
    }

    let score = stored_score(outcome.obtained_marks)?;
    if !repositories::sessions::complete(&mut *tx, session.id, score, now).await? {
        return Err(ScoringError::SessionUnavailable);
    }

    write_audit_row(&mut tx, session.id, &outcome, now).await;

    tx.commit().await?;

    Ok(SubmissionResult {
        session_id: session.id,
        obtained_marks: outcome.obtained_marks,
        total_marks: outcome.total_marks,
        percentage: outcome.percentage(),
        answered: outcome.answers.len(),
    })
}

/// The session row stores obtained marks as `INTEGER`; anything wider fails
/// the submission instead of being clamped.
fn stored_score(obtained_marks: i64) -> Result<i32, ScoringError> {
    i32::try_from(obtained_marks).map_err(|_| ScoringError::ScoreOutOfRange(obtained_marks))
}

pub(crate) fn audit_message(outcome: &ScoreOutcome) -> String {
    format!(
        "Score: {}/{} ({:.1}%)",
        outcome.obtained_marks,
        outcome.total_marks,
        outcome.percentage()
    )
}

async fn write_audit_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    session_id: i64,
    outcome: &ScoreOutcome,
    now: time::PrimitiveDateTime,
) {
    let message = audit_message(outcome);

    let mut savepoint = match Connection::begin(&mut **tx).await {
        Ok(savepoint) => savepoint,
        Err(err) => {
            tracing::warn!(session_id, error = %err, "Skipping exam_end audit log");
            return;
        }
    };

    let appended = repositories::proctoring_logs::append(
        &mut *savepoint,
        NewLog {
            session_id,
            log_type: "exam_end",
            details: Some(&message),
            screenshot: None,
            screenshot_sha256: None,
            screenshot_omitted: false,
            timestamp: now,
        },
    )
    .await;

    let finished = match appended {
        Ok(_) => savepoint.commit().await,
        Err(err) => {
            tracing::warn!(session_id, error = %err, "Failed to write exam_end audit log");
            savepoint.rollback().await
        }
    };

    if let Err(err) = finished {
        tracing::warn!(session_id, error = %err, "Failed to close audit savepoint");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_message_formats_one_decimal() {
        let outcome = ScoreOutcome { obtained_marks: 5, total_marks: 15, answers: Vec::new() };
        assert_eq!(audit_message(&outcome), "Score: 5/15 (33.3%)");
    }

    #[test]
    fn oversized_score_is_an_error() {
        assert_eq!(stored_score(15).expect("fits"), 15);
        let too_large = i64::from(i32::MAX) * 2;
        assert!(matches!(
            stored_score(too_large),
            Err(ScoringError::ScoreOutOfRange(value)) if value == too_large
        ));
    }

    #[test]
    fn audit_message_handles_zero_total() {
        let outcome = ScoreOutcome { obtained_marks: 0, total_marks: 0, answers: Vec::new() };
        assert_eq!(audit_message(&outcome), "Score: 0/0 (0.0%)");
    }
}
