use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{validate_password_len, validate_payload, validate_username};
use crate::core::security;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{UserCreate, UserLogin, UserResponse};

/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    validate_payload(&payload)?;
    validate_username(&payload.username)?;
    validate_password_len(&payload.password)?;

    let rate_key = format!("rl:register:{}", payload.username);
    let limit = state.settings().security().login_attempts_per_minute;
    if !state.redis().allow(&rate_key, limit, AUTH_RATE_WINDOW_SECONDS).await {
        return Err(ApiError::TooManyRequests("Too many registration attempts, try again later"));
    }

    let exists = repositories::users::exists_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if exists {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            username: &payload.username,
            email: &payload.email,
            full_name: &payload.full_name,
            hashed_password: &hashed_password,
            role: UserRole::Student,
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("Username already exists".to_string())
        }
        other => ApiError::internal(other, "Failed to create user"),
    })?;

    tracing::info!(user_id = user.id, username = %user.username, "Registered student account");

    Ok((StatusCode::CREATED, Json(token_response(&state, user)?)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    let rate_key = format!("rl:login:{}", payload.username);
    let limit = state.settings().security().login_attempts_per_minute;
    if !state.redis().allow(&rate_key, limit, AUTH_RATE_WINDOW_SECONDS).await {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = repositories::users::find_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    Ok(Json(token_response(&state, user)?))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

fn token_response(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let access_token = security::create_access_token(user.id, user.role, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: UserResponse::from(user),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn register_login_and_me() {
        let ctx = test_support::setup_test_context().await;

        let register = json!({
            "username": "new_student",
            "email": "new_student@example.com",
            "full_name": "New Student",
            "password": "correct-horse",
        });
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(register.clone()),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = test_support::read_json(response).await;
        assert_eq!(body["user"]["role"], "student");
        assert_eq!(body["token_type"], "bearer");

        let duplicate = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(register),
            ))
            .await
            .expect("response");
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let bad_login = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "username": "new_student", "password": "wrong-password" })),
            ))
            .await
            .expect("response");
        assert_eq!(bad_login.status(), StatusCode::UNAUTHORIZED);

        let login = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "username": "new_student", "password": "correct-horse" })),
            ))
            .await
            .expect("response");
        assert_eq!(login.status(), StatusCode::OK);
        let body = test_support::read_json(login).await;
        let token = body["access_token"].as_str().expect("token").to_string();

        let me = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
            .await
            .expect("response");
        assert_eq!(me.status(), StatusCode::OK);
        let body = test_support::read_json(me).await;
        assert_eq!(body["username"], "new_student");
        assert!(body.get("hashed_password").is_none());
    }

    #[tokio::test]
    async fn login_attempts_are_rate_limited() {
        let ctx = test_support::setup_test_context_with(|| {
            std::env::set_var("LOGIN_ATTEMPTS_PER_MINUTE", "2");
        })
        .await;
        std::env::remove_var("LOGIN_ATTEMPTS_PER_MINUTE");
        test_support::insert_student(ctx.state.db(), "limited").await;

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/auth/login",
                    None,
                    Some(json!({ "username": "limited", "password": "nope-nope" })),
                ))
                .await
                .expect("response");
            statuses.push(response.status());
        }

        assert_eq!(
            statuses,
            vec![StatusCode::UNAUTHORIZED, StatusCode::UNAUTHORIZED, StatusCode::TOO_MANY_REQUESTS]
        );
    }
}
