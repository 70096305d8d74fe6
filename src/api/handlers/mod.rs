//! API handlers and shared utilities.
//!
//! This module organizes the service's route handlers and provides the
//! session helpers every authenticated endpoint goes through.

pub mod auth;
pub mod feed;
pub mod health;
pub mod recipes;
pub mod root;
pub mod users;

use axum::http::HeaderMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::session;
use crate::store::users::{self as user_store, User};

use auth::AuthConfig;

/// Resolve the session token on the request to a user id.
///
/// # Errors
/// Returns `InvalidCredential` when the token is missing, malformed,
/// tampered with, or expired.
pub fn require_session(headers: &HeaderMap, config: &AuthConfig) -> Result<Uuid, ApiError> {
    let token = session::extract_token(headers)
        .ok_or_else(|| ApiError::InvalidCredential("Not authenticated.".to_string()))?;
    session::decode_user_id(&token, config.token_secret())
        .map_err(|_| ApiError::InvalidCredential("Not authenticated.".to_string()))
}

/// Resolve the session on the request to the full user document.
///
/// # Errors
/// Returns `InvalidCredential` for a bad session and `NotFound` when the
/// account behind a valid token has since been deleted.
pub async fn current_user(
    pool: &PgPool,
    headers: &HeaderMap,
    config: &AuthConfig,
) -> Result<User, ApiError> {
    let user_id = require_session(headers, config)?;
    user_store::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))
}
