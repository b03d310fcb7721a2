
use axum::http::{Method, StatusCode};
use axum::Router;
use tower::ServiceExt;

use crate::test_support;

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(token), body))
        .await
        .expect("response");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

async fn start_session(app: &Router, token: &str, exam_id: i64) -> i64 {
    let (status, body) =
        call(app, Method::POST, &format!("/api/v1/student/exams/{exam_id}/start"), token, None)
            .await;
    assert!(status.is_success(), "start exam: {status} {body}");
    body["session_id"].as_i64().expect("session id")
}
