/**
 * User Routes
 * Back-office accounts. Passwords are bcrypt-hashed before they reach storage
 * and never appear in responses.
 */
use axum::extract::{Path, State};
use bcrypt::DEFAULT_COST;

use crate::routes::{created, deleted, found, updated, ApiError, ApiResult, Validated};
use crate::schema::{InsertUser, UserPatch};
use crate::state::AppState;
use crate::storage::EntityId;

const HASH_COST: u32 = if cfg!(test) { 4 } else { DEFAULT_COST };

/// Hash on the blocking pool.
async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::Internal("Failed to hash password")
        })?
        .map_err(|e| {
            tracing::error!("Error hashing password: {}", e);
            ApiError::Internal("Failed to hash password")
        })
}

/// 409 when `username` or `email` belongs to a user other than `current`.
async fn ensure_unique(
    state: &AppState,
    username: Option<&str>,
    email: Option<&str>,
    current: Option<&EntityId>,
) -> Result<(), ApiError> {
    let is_other = |id: &EntityId| current != Some(id);

    if let Some(username) = username {
        if let Some(existing) = state.storage.get_user_by_username(username).await? {
            if is_other(&existing.id) {
                return Err(ApiError::Conflict("Username already taken".to_string()));
            }
        }
    }
    if let Some(email) = email {
        if let Some(existing) = state.storage.get_user_by_email(email).await? {
            if is_other(&existing.id) {
                return Err(ApiError::Conflict("Email already registered".to_string()));
            }
        }
    }
    Ok(())
}

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult {
    Ok(found("users", state.storage.get_users().await?))
}

/// GET /api/admin/users/{id}
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let user = state
        .storage
        .get_user(&EntityId::from(id))
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(found("user", user))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    Validated(mut input): Validated<InsertUser>,
) -> ApiResult {
    ensure_unique(&state, Some(&input.username), Some(&input.email), None).await?;
    input.password = hash_password(input.password).await?;

    let user = state.storage.create_user(input).await?;
    tracing::info!(id = %user.id, username = %user.username, "User created");
    Ok(created("user", user))
}

/// PUT /api/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Validated(mut patch): Validated<UserPatch>,
) -> ApiResult {
    let id = EntityId::from(id);
    if state.storage.get_user(&id).await?.is_none() {
        return Err(ApiError::NotFound("User"));
    }
    ensure_unique(
        &state,
        patch.username.as_deref(),
        patch.email.as_deref(),
        Some(&id),
    )
    .await?;
    if let Some(password) = patch.password.take() {
        patch.password = Some(hash_password(password).await?);
    }

    let user = state
        .storage
        .update_user(&id, patch)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(updated("user", user))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if !state.storage.delete_user(&EntityId::from(id)).await? {
        return Err(ApiError::NotFound("User"));
    }
    Ok(deleted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{app, send};
    use crate::storage::Storage;
    use axum::http::StatusCode;
    use serde_json::json;

    fn owner() -> serde_json::Value {
        json!({
            "username": "owner",
            "email": "Owner@Example.com",
            "password": "correct horse",
            "role": "admin"
        })
    }

    #[tokio::test]
    async fn test_password_is_hashed_and_hidden() {
        let (app, storage) = app();
        let (status, body) = send(&app, "POST", "/api/admin/users", Some(owner())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["user"].get("password").is_none());
        assert_eq!(body["user"]["email"], "owner@example.com");

        let id = EntityId::from(body["user"]["id"].to_string());
        let stored = storage.get_user(&id).await.unwrap().unwrap();
        assert_ne!(stored.password, "correct horse");
        assert!(bcrypt::verify("correct horse", &stored.password).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (app, _) = app();
        send(&app, "POST", "/api/admin/users", Some(owner())).await;

        let mut again = owner();
        again["email"] = json!("other@example.com");
        let (status, body) = send(&app, "POST", "/api/admin/users", Some(again)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Username already taken");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_case_insensitively() {
        let (app, _) = app();
        send(&app, "POST", "/api/admin/users", Some(owner())).await;

        let mut again = owner();
        again["username"] = json!("second");
        again["email"] = json!("OWNER@example.com");
        let (status, _) = send(&app, "POST", "/api/admin/users", Some(again)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_may_keep_own_username() {
        let (app, storage) = app();
        let (_, body) = send(&app, "POST", "/api/admin/users", Some(owner())).await;
        let id = body["user"]["id"].clone();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/admin/users/{}", id),
            Some(json!({ "username": "owner", "password": "new password 1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "admin");

        let stored = storage
            .get_user(&EntityId::from(id.to_string()))
            .await
            .unwrap()
            .unwrap();
        assert!(bcrypt::verify("new password 1", &stored.password).unwrap());
    }

    #[tokio::test]
    async fn test_short_password_is_rejected() {
        let (app, _) = app();
        let mut body = owner();
        body["password"] = json!("short");
        let (status, res) = send(&app, "POST", "/api/admin/users", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(res["errors"]["password"].is_array());
    }
}
