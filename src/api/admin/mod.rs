mod exams;
mod questions;
mod results;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(results::dashboard))
        .route("/exams", post(exams::create_exam).get(exams::list_exams))
        .route("/exams/:exam_id", get(exams::get_exam).delete(exams::delete_exam))
        .route(
            "/exams/:exam_id/questions",
            post(questions::create_question).get(questions::list_questions),
        )
        .route(
            "/exams/:exam_id/questions/:question_id",
            put(questions::update_question).delete(questions::delete_question),
        )
        .route("/exams/:exam_id/results", get(results::exam_results))
        .route("/sessions/:session_id", get(results::session_detail))
        .route("/sessions/:session_id/proctoring-logs", get(results::proctoring_logs))
}
