//! Authentication: password hashing, bearer tokens, the `AuthUser` extractor,
//! the users table and the `/api/auth` handlers.

pub mod handlers;
pub mod password;
pub mod token;
pub mod users;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::auth::token::TokenKeys;
use crate::errors::AppError;

/// The caller, as identified by a verified bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let keys = TokenKeys::from_ref(state);
        let id = keys.verify(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {e}");
            AppError::Unauthorized("Invalid token".to_string())
        })?;
        Ok(AuthUser { id })
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map(str::trim))
        .transpose()
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No token".to_string()))?;

    match value.strip_prefix("Bearer") {
        Some(rest) if rest.trim().is_empty() => Err(AppError::Unauthorized("No token".to_string())),
        Some(rest) if rest.starts_with(' ') => Ok(rest.trim()),
        _ => Err(AppError::Unauthorized("Invalid token".to_string())),
    }
}
