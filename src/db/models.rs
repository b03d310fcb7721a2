use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{SessionStatus, UserRole};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) created_by: i64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// `correct_option` is always the canonical single letter.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct Question {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) question_text: String,
    pub(crate) option_a: String,
    pub(crate) option_b: String,
    pub(crate) option_c: String,
    pub(crate) option_d: String,
    pub(crate) correct_option: String,
    pub(crate) marks: i32,
}

/// `score` is the raw obtained-marks total, set once on completion.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ExamSession {
    pub(crate) id: i64,
    pub(crate) student_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) status: SessionStatus,
    pub(crate) score: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct StudentAnswer {
    pub(crate) id: i64,
    pub(crate) session_id: i64,
    pub(crate) question_id: i64,
    pub(crate) selected_option: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ProctoringLog {
    pub(crate) id: i64,
    pub(crate) session_id: i64,
    pub(crate) log_type: String,
    pub(crate) details: Option<String>,
    pub(crate) screenshot: Option<String>,
    pub(crate) screenshot_sha256: Option<String>,
    pub(crate) screenshot_omitted: bool,
    pub(crate) timestamp: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub(crate) struct ViolationSummary {
    pub(crate) multiple_faces: i64,
    pub(crate) face_missing: i64,
    pub(crate) tab_switch: i64,
    pub(crate) phone_usage_suspected: i64,
    pub(crate) serious_violation: i64,
    pub(crate) total: i64,
}
