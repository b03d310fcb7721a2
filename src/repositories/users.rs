use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str =
    "id, username, email, full_name, hashed_password, role, is_active, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_username(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) username: &'a str,
    pub(crate) email: &'a str,
    pub(crate) full_name: &'a str,
    pub(crate) hashed_password: &'a str,
    pub(crate) role: UserRole,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    let now = primitive_now_utc();
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            username, email, full_name, hashed_password, role, is_active, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,TRUE,$6,$6)
        RETURNING {COLUMNS}",
    ))
    .bind(params.username)
    .bind(params.email)
    .bind(params.full_name)
    .bind(params.hashed_password)
    .bind(params.role)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn promote_admin(
    pool: &PgPool,
    id: i64,
    hashed_password: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users
         SET hashed_password = $1, role = $2, is_active = TRUE, updated_at = $3
         WHERE id = $4",
    )
    .bind(hashed_password)
    .bind(UserRole::Admin)
    .bind(primitive_now_utc())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}
