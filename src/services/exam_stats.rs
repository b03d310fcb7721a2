use serde::Serialize;

use crate::repositories::questions::QuestionStatsRow;
use crate::services::scoring::percentage;

/// A result passes at 70% of the exam's total marks.
const PASS_RATIO: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ExamStats {
    pub(crate) total_students: usize,
    /// Mean raw score in marks, not a percentage.
    pub(crate) average_score: f64,
    /// Rounded percentage of students who passed.
    pub(crate) pass_rate: i64,
}

pub(crate) fn exam_stats(scores: &[i32], total_marks: i64) -> ExamStats {
    if scores.is_empty() {
        return ExamStats { total_students: 0, average_score: 0.0, pass_rate: 0 };
    }

    let total_students = scores.len();
    let sum: i64 = scores.iter().map(|score| i64::from(*score)).sum();
    let average_score = round_to(sum as f64 / total_students as f64, 2);

    let passed = if total_marks > 0 {
        scores
            .iter()
            .filter(|score| f64::from(**score) / total_marks as f64 >= PASS_RATIO)
            .count()
    } else {
        0
    };
    let pass_rate = (passed as f64 / total_students as f64 * 100.0).round() as i64;

    ExamStats { total_students, average_score, pass_rate }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct QuestionStats {
    pub(crate) question_id: i64,
    pub(crate) question_text: String,
    pub(crate) marks: i32,
    pub(crate) correct_count: i64,
    pub(crate) incorrect_count: i64,
    pub(crate) success_rate: i64,
}

impl From<QuestionStatsRow> for QuestionStats {
    fn from(row: QuestionStatsRow) -> Self {
        let attempts = row.correct_count + row.incorrect_count;
        Self {
            question_id: row.id,
            question_text: row.question_text,
            marks: row.marks,
            correct_count: row.correct_count,
            incorrect_count: row.incorrect_count,
            success_rate: percentage(row.correct_count, attempts).round() as i64,
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
