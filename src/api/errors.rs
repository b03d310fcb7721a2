use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::exam_finalize::ScoringError;
use crate::services::session_lifecycle::StartExamError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    /// The request is well formed but the session or exam is in the wrong state.
    Conflict(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::TooManyRequests(message) => message.to_string(),
            Self::BadRequest(message) | Self::NotFound(message) | Self::Conflict(message) => {
                message
            }
            Self::Internal(context) => {
                tracing::debug!(context = %context, "Responding with internal server error");
                "Internal server error".to_string()
            }
        };

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::SessionUnavailable | ScoringError::NoQuestions => {
                Self::Conflict(err.to_string())
            }
            ScoringError::NotOwner => Self::Forbidden("You do not have access to this session"),
            ScoringError::Persistence(err) => Self::internal(err, "Failed to submit answers"),
            ScoringError::ScoreOutOfRange(_) => Self::internal(err, "Failed to store exam score"),
        }
    }
}

impl From<StartExamError> for ApiError {
    fn from(err: StartExamError) -> Self {
        match err {
            StartExamError::ExamNotFound => Self::NotFound(err.to_string()),
            StartExamError::NotActive | StartExamError::AlreadyCompleted { .. } => {
                Self::Conflict(err.to_string())
            }
            StartExamError::Persistence(err) => Self::internal(err, "Failed to start exam"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn internal_errors_hide_context() {
        let response = ApiError::internal("boom", "Failed to do the thing").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["status"], 500);
        assert_eq!(json["detail"], "Internal server error");
    }

    #[tokio::test]
    async fn unauthorized_sets_bearer_challenge() {
        let response = ApiError::Unauthorized("nope").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn request_state_errors_map_to_conflict() {
        let completed = ApiError::from(StartExamError::AlreadyCompleted { session_id: 3 });
        assert!(matches!(
            completed,
            ApiError::Conflict(ref m) if m == "You have already completed this exam"
        ));

        let submitted = ApiError::from(ScoringError::SessionUnavailable);
        assert!(matches!(
            submitted,
            ApiError::Conflict(ref m) if m == "Invalid or already completed session"
        ));

        assert!(matches!(ApiError::from(StartExamError::ExamNotFound), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from(ScoringError::NotOwner), ApiError::Forbidden(_)));
    }

    #[test]
    fn oversized_score_is_internal() {
        let err = ApiError::from(ScoringError::ScoreOutOfRange(i64::MAX));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
