mod dashboard;
mod proctoring;
mod session;
mod submit;
#[cfg(test)]
mod tests;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/exams/active", get(dashboard::active_exams))
        .route("/exams/:exam_id/start", post(session::start_exam))
        .route("/sessions/:session_id", get(session::take_exam))
        .route("/sessions/:session_id/results", get(submit::view_results))
        .route("/exam/submit", post(submit::submit_exam))
        .route("/proctoring/log", post(proctoring::log_event))
}
