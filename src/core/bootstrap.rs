use anyhow::Context;

use crate::core::security;
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::repositories;

/// Creates the configured administrator, or repairs its password and role if
/// the account already exists.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin creation");
        return Ok(());
    }

    let username = admin.first_admin_username.as_str();
    let existing = repositories::users::find_by_username(state.db(), username)
        .await
        .context("Failed to look up default admin")?;

    if let Some(user) = existing {
        let password_matches =
            security::verify_password(&admin.first_admin_password, &user.hashed_password)
                .unwrap_or(false);

        if password_matches && user.role == UserRole::Admin && user.is_active {
            tracing::info!(username, "Default admin already up to date");
            return Ok(());
        }

        let hashed_password = if password_matches {
            user.hashed_password.clone()
        } else {
            security::hash_password(&admin.first_admin_password)?
        };

        repositories::users::promote_admin(state.db(), user.id, &hashed_password)
            .await
            .context("Failed to update default admin")?;

        tracing::info!(username, user_id = user.id, "Updated default admin");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            username,
            email: &admin.first_admin_email,
            full_name: "Administrator",
            hashed_password: &hashed_password,
            role: UserRole::Admin,
        },
    )
    .await
    .context("Failed to create default admin")?;

    tracing::info!(username, user_id = user.id, "Created default admin");
    Ok(())
}
