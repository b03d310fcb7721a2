use sqlx::PgPool;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::core::{metrics, time as clock};
use crate::db::models::{Exam, ExamSession};
use crate::db::types::SessionStatus;
use crate::repositories;

#[derive(Debug, Error)]
pub(crate) enum StartExamError {
    #[error("Exam not found")]
    ExamNotFound,
    #[error("This exam is not currently active")]
    NotActive,
    #[error("You have already completed this exam")]
    AlreadyCompleted { session_id: i64 },
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

#[derive(Debug)]
pub(crate) struct StartedSession {
    pub(crate) session: ExamSession,
    pub(crate) reused: bool,
}

/// Starts or resumes the student's single attempt at `exam_id`.
///
/// The check-and-insert runs under a transaction-scoped advisory lock for the
/// (exam, student) pair; the unique pair constraint backs it up.
pub(crate) async fn start_exam(
    pool: &PgPool,
    exam_id: i64,
    student_id: i64,
    now: PrimitiveDateTime,
) -> Result<StartedSession, StartExamError> {
    let result = start_in_transaction(pool, exam_id, student_id, now).await;

    let outcome = match &result {
        Ok(started) if started.reused => "reused",
        Ok(_) => "created",
        Err(StartExamError::Persistence(_)) => "error",
        Err(_) => "rejected",
    };
    metrics::record_session_start(outcome);

    match &result {
        Ok(started) => tracing::info!(
            session_id = started.session.id,
            exam_id,
            student_id,
            reused = started.reused,
            "Exam session started"
        ),
        Err(StartExamError::Persistence(err)) => {
            tracing::error!(exam_id, student_id, error = %err, "Failed to start exam session")
        }
        Err(err) => tracing::info!(exam_id, student_id, reason = %err, "Exam start rejected"),
    }

    result
}

async fn start_in_transaction(
    pool: &PgPool,
    exam_id: i64,
    student_id: i64,
    now: PrimitiveDateTime,
) -> Result<StartedSession, StartExamError> {
    let mut tx = pool.begin().await?;

    let exam = repositories::exams::find_by_id(&mut *tx, exam_id)
        .await?
        .ok_or(StartExamError::ExamNotFound)?;

    if !clock::window_contains(exam.start_time, exam.end_time, now) {
        return Err(StartExamError::NotActive);
    }

    repositories::sessions::acquire_pair_lock(&mut *tx, exam_id, student_id).await?;

    if let Some(existing) = repositories::sessions::find_by_pair(&mut *tx, student_id, exam_id).await?
    {
        let started = resume(existing)?;
        tx.commit().await?;
        return Ok(started);
    }

    let started = match repositories::sessions::create(&mut *tx, student_id, exam_id, now).await? {
        Some(session) => StartedSession { session, reused: false },
        None => {
            let existing = repositories::sessions::find_by_pair(&mut *tx, student_id, exam_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            resume(existing)?
        }
    };

    tx.commit().await?;
    Ok(started)
}

fn resume(existing: ExamSession) -> Result<StartedSession, StartExamError> {
    match existing.status {
        SessionStatus::InProgress => Ok(StartedSession { session: existing, reused: true }),
        SessionStatus::Completed => {
            Err(StartExamError::AlreadyCompleted { session_id: existing.id })
        }
    }
}

/// The attempt ends at `start + duration` or at the exam's end, whichever
/// comes first.
pub(crate) fn session_deadline(session: &ExamSession, exam: &Exam) -> PrimitiveDateTime {
    let by_duration = session.start_time + clock::minutes(exam.duration_minutes);
    by_duration.min(exam.end_time)
}

pub(crate) fn remaining_seconds(
    session: &ExamSession,
    exam: &Exam,
    now: PrimitiveDateTime,
) -> i64 {
    clock::seconds_until(session_deadline(session, exam), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month, Time};

    fn at(hour: u8, minute: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2025, Month::March, 10).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(hour, minute, 0).unwrap())
    }

    fn exam(duration_minutes: i32, start: PrimitiveDateTime, end: PrimitiveDateTime) -> Exam {
        Exam {
            id: 1,
            title: "Algebra".to_string(),
            description: None,
            duration_minutes,
            start_time: start,
            end_time: end,
            created_by: 1,
            created_at: start,
            updated_at: start,
        }
    }

    fn session(started: PrimitiveDateTime, status: SessionStatus) -> ExamSession {
        ExamSession {
            id: 11,
            student_id: 2,
            exam_id: 1,
            start_time: started,
            end_time: None,
            status,
            score: None,
        }
    }

    #[test]
    fn deadline_is_capped_by_exam_end() {
        let exam = exam(90, at(9, 0), at(10, 0));
        let session = session(at(9, 30), SessionStatus::InProgress);

        assert_eq!(session_deadline(&session, &exam), at(10, 0));
        assert_eq!(remaining_seconds(&session, &exam, at(9, 45)), 15 * 60);
    }

    #[test]
    fn deadline_follows_duration_when_earlier() {
        let exam = exam(30, at(9, 0), at(12, 0));
        let session = session(at(9, 10), SessionStatus::InProgress);

        assert_eq!(session_deadline(&session, &exam), at(9, 40));
        assert_eq!(remaining_seconds(&session, &exam, at(10, 0)), 0);
    }

    #[test]
    fn resume_reuses_in_progress_and_rejects_completed() {
        let started = resume(session(at(9, 0), SessionStatus::InProgress)).expect("resume");
        assert!(started.reused);
        assert_eq!(started.session.id, 11);

        let err = resume(session(at(9, 0), SessionStatus::Completed)).unwrap_err();
        assert!(matches!(err, StartExamError::AlreadyCompleted { session_id: 11 }));
    }
}
