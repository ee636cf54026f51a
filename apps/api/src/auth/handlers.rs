//! Axum route handlers for `/api/auth`.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::users::{create_user, find_by_email, find_by_username};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Identity-provider profile forwarded by the frontend after a successful
/// provider sign-in.
#[derive(Debug, Deserialize)]
pub struct ProviderLogin {
    pub email: String,
    pub name: String,
    pub uid: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

fn invalid_credentials() -> AppError {
    AppError::Validation("Invalid credentials".to_string())
}

/// POST /api/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".to_string(),
        ));
    }

    if find_by_username(&state.db, username).await?.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let hash = hash_password(&req.password)?;
    let user = create_user(&state.db, username, None, Some(hash.as_str())).await?;
    info!("Registered user {}", user.id);

    let token = state.tokens.issue(user.id).map_err(anyhow::Error::from)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            username: user.username,
            msg: None,
        }),
    ))
}

/// POST /api/auth/login
///
/// Unknown user and wrong password return the same message.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = find_by_username(&state.db, req.username.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let hash = user.password_hash.as_deref().ok_or_else(invalid_credentials)?;
    if !verify_password(&req.password, hash) {
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(user.id).map_err(anyhow::Error::from)?;
    Ok(Json(AuthResponse {
        token,
        username: user.username,
        msg: None,
    }))
}

/// POST /api/auth/google
///
/// Finds the account by email or creates a password-less one named
/// `{name}-{first five chars of uid}`.
pub async fn handle_provider_login(
    State(state): State<AppState>,
    Json(req): Json<ProviderLogin>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim();
    if email.is_empty() || req.uid.is_empty() {
        return Err(AppError::Validation("email and uid are required".to_string()));
    }

    let user = match find_by_email(&state.db, email).await? {
        Some(user) => user,
        None => {
            let username = provider_username(&req.name, &req.uid);
            let user = create_user(&state.db, &username, Some(email), None).await?;
            info!("Created identity-provider user {}", user.id);
            user
        }
    };

    let token = state.tokens.issue(user.id).map_err(anyhow::Error::from)?;
    Ok(Json(AuthResponse {
        token,
        username: user.username,
        msg: Some("Google login successful".to_string()),
    }))
}

fn provider_username(name: &str, uid: &str) -> String {
    let suffix: String = uid.chars().take(5).collect();
    format!("{}-{suffix}", name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_username_uses_uid_prefix() {
        assert_eq!(provider_username("Asha", "Xy12345abcdef"), "Asha-Xy123");
    }

    #[test]
    fn test_provider_username_short_uid() {
        assert_eq!(provider_username(" Ravi ", "ab"), "Ravi-ab");
    }

    #[test]
    fn test_auth_response_omits_empty_msg() {
        let body = serde_json::to_value(AuthResponse {
            token: "t".to_string(),
            username: "u".to_string(),
            msg: None,
        })
        .unwrap();
        assert!(body.get("msg").is_none());
    }
}
