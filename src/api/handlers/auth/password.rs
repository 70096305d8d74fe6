//! Password changes: the authenticated reset and the recovery flow.

use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::handlers::current_user;
use crate::password;
use crate::store::users::{self as user_store};

use super::types::{CheckInformationRequest, PasswordResetRequest, PasswordSetRequest};
use super::{normalize_email, require_payload, AuthConfig};

/// Change the password of the logged-in user, proving the old one first.
#[utoipa::path(
    post,
    path = "/auth/password/reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Not authenticated or wrong old password")
    ),
    tag = "auth"
)]
pub async fn reset(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<PasswordResetRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload, "a request body")?;
    if request.old_password.is_empty() {
        return Err(ApiError::MissingField("old password"));
    }
    if request.new_password.trim().is_empty() {
        return Err(ApiError::MissingField("new password"));
    }

    let mut user = current_user(&pool, &headers, &config).await?;

    if !password::verify(&request.old_password, &user.password_hash) {
        return Err(ApiError::InvalidCredential(
            "Old password is incorrect.".to_string(),
        ));
    }

    user.password_hash = password::hash(&request.new_password)?;
    user_store::save(&pool, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password has been updated.",
    })))
}

/// Set a new password after account recovery.
///
/// The recovery proof (security-recovery OTP or security questions) happens
/// in its own request; this endpoint only applies the new password.
#[utoipa::path(
    post,
    path = "/auth/password/set",
    request_body = PasswordSetRequest,
    responses(
        (status = 200, description = "Password set"),
        (status = 400, description = "Missing field"),
        (status = 404, description = "Unknown email")
    ),
    tag = "auth"
)]
pub async fn set(
    pool: Extension<PgPool>,
    payload: Option<Json<PasswordSetRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload, "a request body")?;

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }
    if request.new_password.trim().is_empty() {
        return Err(ApiError::MissingField("new password"));
    }

    let mut user = user_store::find_by_email(&pool, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    user.password_hash = password::hash(&request.new_password)?;
    user_store::save(&pool, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password has been updated.",
    })))
}

/// Tell the recovery flow what the account offers: security questions,
/// or only the mailed code.
#[utoipa::path(
    post,
    path = "/auth/check-information",
    request_body = CheckInformationRequest,
    responses(
        (status = 200, description = "Account recovery options"),
        (status = 400, description = "Missing field"),
        (status = 404, description = "Unknown email")
    ),
    tag = "auth"
)]
pub async fn check_information(
    pool: Extension<PgPool>,
    payload: Option<Json<CheckInformationRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload, "a request body")?;

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }

    let user = user_store::find_by_email(&pool, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "User found.",
        "name": user.name,
        "has_security_questions": user.verification.has_security_questions,
    })))
}
