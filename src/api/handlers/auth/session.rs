//! Session check and logout.

use anyhow::Context;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::handlers::current_user;
use crate::session;

use super::types::SessionUser;
use super::AuthConfig;

/// Who the presented session token belongs to.
#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Session is valid", body = SessionUser),
        (status = 401, description = "Missing, invalid, or expired session token")
    ),
    tag = "auth"
)]
pub async fn get_session(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = current_user(&pool, &headers, &config).await?;
    Ok(Json(json!({
        "success": true,
        "user": SessionUser::from(&user),
    })))
}

/// Clear the session cookie. Signed tokens are not revocable server-side;
/// a copied token stays valid until its natural expiry.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(config: Extension<Arc<AuthConfig>>) -> Result<Response, ApiError> {
    let cookie = session::clear_session_cookie(config.environment())
        .context("failed to build logout cookie")?;

    let mut response = Json(json!({
        "success": true,
        "message": "Logged out.",
    }))
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}
