use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::core::time::format_primitive;
use crate::db::types::SessionStatus;
use crate::repositories::answers::GradedQuestionRow;
use crate::repositories::sessions::{RecentSessionRow, StudentResultRow};
use crate::schemas::exam::{ExamResponse, StudentQuestionResponse};
use crate::schemas::user::UserResponse;
use crate::services::scoring::percentage;

/// Longest selected option a student answer row can hold.
pub(crate) const MAX_SELECTED_OPTION_LEN: usize = 50;

#[derive(Debug, Serialize)]
pub(crate) struct StartExamResponse {
    pub(crate) session_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) status: SessionStatus,
    pub(crate) start_time: String,
    pub(crate) reused: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct TakeExamResponse {
    pub(crate) session_id: i64,
    pub(crate) status: SessionStatus,
    pub(crate) start_time: String,
    pub(crate) deadline: String,
    pub(crate) remaining_seconds: i64,
    pub(crate) exam: ExamResponse,
    pub(crate) questions: Vec<StudentQuestionResponse>,
}

/// `session_id` is optional here so a missing id maps to a 400 with a
/// readable message instead of a deserialization rejection.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitAnswersRequest {
    #[serde(default)]
    pub(crate) session_id: Option<i64>,
    #[serde(default)]
    #[validate(custom(function = "validate_answer_lengths"))]
    pub(crate) answers: HashMap<String, String>,
}

fn validate_answer_lengths(answers: &HashMap<String, String>) -> Result<(), ValidationError> {
    if answers.values().all(|value| value.trim().chars().count() <= MAX_SELECTED_OPTION_LEN) {
        Ok(())
    } else {
        let message = format!("answers must be at most {MAX_SELECTED_OPTION_LEN} characters");
        Err(ValidationError::new("answer_too_long").with_message(message.into()))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitAnswersResponse {
    pub(crate) status: &'static str,
    /// Percentage of total marks.
    pub(crate) score: f64,
    pub(crate) obtained_marks: i64,
    pub(crate) total_marks: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradedQuestionEntry {
    pub(crate) question_id: i64,
    pub(crate) question_text: String,
    pub(crate) option_a: String,
    pub(crate) option_b: String,
    pub(crate) option_c: String,
    pub(crate) option_d: String,
    pub(crate) correct_option: String,
    pub(crate) marks: i32,
    pub(crate) selected_option: Option<String>,
    pub(crate) is_correct: bool,
}

impl From<GradedQuestionRow> for GradedQuestionEntry {
    fn from(row: GradedQuestionRow) -> Self {
        Self {
            question_id: row.question_id,
            question_text: row.question_text,
            option_a: row.option_a,
            option_b: row.option_b,
            option_c: row.option_c,
            option_d: row.option_d,
            correct_option: row.correct_option,
            marks: row.marks,
            selected_option: row.selected_option,
            is_correct: row.is_correct.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResultResponse {
    pub(crate) session_id: i64,
    pub(crate) status: SessionStatus,
    pub(crate) start_time: String,
    pub(crate) end_time: Option<String>,
    /// Raw obtained marks; `None` until the session completes.
    pub(crate) score: Option<i32>,
    pub(crate) total_marks: i64,
    pub(crate) percentage: Option<f64>,
    pub(crate) exam: ExamResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) student: Option<UserResponse>,
    pub(crate) answers: Vec<GradedQuestionEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResultEntry {
    pub(crate) session_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) exam_title: String,
    pub(crate) start_time: String,
    pub(crate) end_time: Option<String>,
    pub(crate) score: i32,
    pub(crate) total_marks: i64,
    pub(crate) percentage: f64,
}

impl From<StudentResultRow> for StudentResultEntry {
    fn from(row: StudentResultRow) -> Self {
        Self {
            session_id: row.session_id,
            exam_id: row.exam_id,
            exam_title: row.exam_title,
            start_time: format_primitive(row.start_time),
            end_time: row.end_time.map(format_primitive),
            score: row.score,
            total_marks: row.total_marks,
            percentage: percentage(i64::from(row.score), row.total_marks),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentDashboardResponse {
    pub(crate) active_exams: Vec<ExamResponse>,
    pub(crate) completed_count: usize,
    pub(crate) upcoming_count: i64,
    /// Rounded mean of raw scores; `None` before the first completed exam.
    pub(crate) average_score: Option<i64>,
    pub(crate) completed_sessions: Vec<StudentResultEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecentSessionEntry {
    pub(crate) session_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) exam_title: String,
    pub(crate) student_id: i64,
    pub(crate) username: String,
    pub(crate) status: SessionStatus,
    pub(crate) start_time: String,
    pub(crate) end_time: Option<String>,
    pub(crate) score: Option<i32>,
    pub(crate) total_marks: i64,
    pub(crate) percentage: Option<f64>,
}

impl From<RecentSessionRow> for RecentSessionEntry {
    fn from(row: RecentSessionRow) -> Self {
        Self {
            session_id: row.session_id,
            exam_id: row.exam_id,
            exam_title: row.exam_title,
            student_id: row.student_id,
            username: row.username,
            status: row.status,
            start_time: format_primitive(row.start_time),
            end_time: row.end_time.map(format_primitive),
            score: row.score,
            total_marks: row.total_marks,
            percentage: row.score.map(|score| percentage(i64::from(score), row.total_marks)),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminDashboardResponse {
    pub(crate) exams: Vec<ExamResponse>,
    pub(crate) recent_sessions: Vec<RecentSessionEntry>,
}
