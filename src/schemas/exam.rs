use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Exam, Question};
use crate::services::exam_stats::{ExamStats, QuestionStats};
use crate::services::scoring::normalize_option;

const OPTION_LETTERS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(alias = "startTime", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) start_time: OffsetDateTime,
    #[serde(alias = "endTime", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) end_time: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) created_by: i64,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<Exam> for ExamResponse {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            duration_minutes: exam.duration_minutes,
            start_time: format_primitive(exam.start_time),
            end_time: format_primitive(exam.end_time),
            created_by: exam.created_by,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamDetailResponse {
    #[serde(flatten)]
    pub(crate) exam: ExamResponse,
    pub(crate) total_marks: i64,
    pub(crate) questions: Vec<QuestionResponse>,
}

/// Used for both create and full replace.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionPayload {
    #[serde(alias = "questionText")]
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    #[validate(length(min = 1, max = 255, message = "option_a must be 1-255 characters"))]
    pub(crate) option_a: String,
    #[validate(length(min = 1, max = 255, message = "option_b must be 1-255 characters"))]
    pub(crate) option_b: String,
    #[validate(length(min = 1, max = 255, message = "option_c must be 1-255 characters"))]
    pub(crate) option_c: String,
    #[validate(length(min = 1, max = 255, message = "option_d must be 1-255 characters"))]
    pub(crate) option_d: String,
    #[serde(alias = "correctOption")]
    pub(crate) correct_option: String,
    #[serde(default = "default_marks")]
    #[validate(range(min = 1, max = 1000, message = "marks must be between 1 and 1000"))]
    pub(crate) marks: i32,
}

impl QuestionPayload {
    /// `"b"` and `"option_b"` both canonicalize to `"b"`.
    pub(crate) fn canonical_correct_option(&self) -> Option<String> {
        let normalized = normalize_option(&self.correct_option);
        OPTION_LETTERS.contains(&normalized.as_str()).then_some(normalized)
    }
}

/// Admin view, including the answer key.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
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

impl From<Question> for QuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            question_text: question.question_text,
            option_a: question.option_a,
            option_b: question.option_b,
            option_c: question.option_c,
            option_d: question.option_d,
            correct_option: question.correct_option,
            marks: question.marks,
        }
    }
}

/// Student view: never carries the answer key.
#[derive(Debug, Serialize)]
pub(crate) struct StudentQuestionResponse {
    pub(crate) id: i64,
    pub(crate) question_text: String,
    pub(crate) option_a: String,
    pub(crate) option_b: String,
    pub(crate) option_c: String,
    pub(crate) option_d: String,
    pub(crate) marks: i32,
}

impl From<Question> for StudentQuestionResponse {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            option_a: question.option_a,
            option_b: question.option_b,
            option_c: question.option_c,
            option_d: question.option_d,
            marks: question.marks,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResultEntry {
    pub(crate) session_id: i64,
    pub(crate) student_id: i64,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) start_time: String,
    pub(crate) end_time: Option<String>,
    /// Raw obtained marks.
    pub(crate) score: i32,
    pub(crate) percentage: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResultsResponse {
    pub(crate) exam: ExamResponse,
    pub(crate) total_marks: i64,
    pub(crate) results: Vec<ExamResultEntry>,
    pub(crate) stats: ExamStats,
    pub(crate) question_stats: Vec<QuestionStats>,
}

fn default_marks() -> i32 {
    1
}

fn parse_offset_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // HTML datetime-local inputs send no offset and may omit seconds.
    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value.assume_utc());
    }
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }

    None
}

fn deserialize_offset_datetime_flexible<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_offset_datetime_flexible(&raw)
        .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(correct_option: &str) -> QuestionPayload {
        QuestionPayload {
            question_text: "Capital of France?".to_string(),
            option_a: "Berlin".to_string(),
            option_b: "Paris".to_string(),
            option_c: "Rome".to_string(),
            option_d: "Madrid".to_string(),
            correct_option: correct_option.to_string(),
            marks: 2,
        }
    }

    #[test]
    fn correct_option_accepts_both_shapes() {
        assert_eq!(payload("b").canonical_correct_option().as_deref(), Some("b"));
        assert_eq!(payload("option_B").canonical_correct_option().as_deref(), Some("b"));
        assert_eq!(payload("e").canonical_correct_option(), None);
        assert_eq!(payload("option_1").canonical_correct_option(), None);
        assert_eq!(payload("zzb").canonical_correct_option(), None);
    }

    #[test]
    fn marks_are_bounded() {
        let mut question = payload("a");
        assert!(question.validate().is_ok());

        question.marks = 1001;
        assert!(question.validate().is_err());
        question.marks = i32::MAX;
        assert!(question.validate().is_err());
        question.marks = 0;
        assert!(question.validate().is_err());
    }

    #[test]
    fn exam_times_accept_datetime_local() {
        let body = r#"{
            "title": "Midterm",
            "duration_minutes": 60,
            "start_time": "2025-05-01T09:00",
            "end_time": "2025-05-01T12:00:00+03:00"
        }"#;
        let exam: ExamCreate = serde_json::from_str(body).expect("exam");

        assert_eq!(exam.start_time.hour(), 9);
        assert_eq!(exam.end_time.to_offset(time::UtcOffset::UTC).hour(), 9);
    }
}
