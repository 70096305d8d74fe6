//! Account registration.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::email::MailSender;
use crate::api::error::ApiError;
use crate::otp::{self, Purpose};
use crate::password;
use crate::store::users::{self as user_store, InsertOutcome, User};

use super::types::RegisterRequest;
use super::{normalize_email, require_payload, send_otp_mail, valid_email, AuthConfig};

/// Create the account and send the account-confirmation code in one step.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, confirmation code sent"),
        (status = 400, description = "Missing or invalid field"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    mailer: Extension<Arc<dyn MailSender>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload, "a request body")?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::MissingField("name"));
    }
    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }
    if !valid_email(&email) {
        return Err(ApiError::MissingField("a valid email address"));
    }
    if request.password.trim().is_empty() {
        return Err(ApiError::MissingField("password"));
    }

    let password_hash = password::hash(&request.password)?;
    let mut user = User::new(name.to_string(), email, password_hash);
    // Issue before insert so a failed insert never leaves a stored code.
    let code = otp::issue(&mut user.verification, Purpose::ConfirmAccount, Utc::now())?;

    match user_store::insert(&pool, &user).await? {
        InsertOutcome::EmailTaken => {
            return Err(ApiError::AlreadyInState(
                "An account with this email already exists.".to_string(),
            ))
        }
        InsertOutcome::Created => {}
    }

    send_otp_mail(&config, &mailer, &user.email, Purpose::ConfirmAccount, &code);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration successful. Please check your email for the verification code.",
            "user_id": user.id,
        })),
    ))
}
