//! OTP issue and verification endpoints, one pair shared by all purposes.

use anyhow::Context;
use axum::{
    extract::{Extension, Path},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::email::MailSender;
use crate::api::error::ApiError;
use crate::otp::{self, Purpose};
use crate::session;
use crate::store::users::{self as user_store};

use super::types::{OtpSendRequest, OtpVerifyRequest, SessionUser};
use super::{normalize_email, require_payload, send_otp_mail, AuthConfig};

fn parse_purpose(slug: &str) -> Result<Purpose, ApiError> {
    Purpose::from_slug(slug)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown verification purpose: {slug}.")))
}

/// Issue a fresh code for the purpose and mail it to the account.
///
/// Reissuing always overwrites the stored code, so at most one code per
/// purpose is live at a time.
#[utoipa::path(
    post,
    path = "/auth/otp/send/{purpose}",
    request_body = OtpSendRequest,
    params(
        ("purpose" = String, Path, description = "One of confirm-account, password-reset, 2fa-toggle, login-2fa, security-recovery")
    ),
    responses(
        (status = 200, description = "Code issued and mailed"),
        (status = 404, description = "Unknown purpose or unknown email"),
        (status = 409, description = "Account already verified (confirm-account only)")
    ),
    tag = "auth"
)]
pub async fn send(
    Path(purpose): Path<String>,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    mailer: Extension<Arc<dyn MailSender>>,
    payload: Option<Json<OtpSendRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let purpose = parse_purpose(&purpose)?;
    let request = require_payload(payload, "a request body")?;

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }

    let mut user = user_store::find_by_email(&pool, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let code = otp::issue(&mut user.verification, purpose, Utc::now())?;
    user_store::save(&pool, &user).await?;
    send_otp_mail(&config, &mailer, &user.email, purpose, &code);

    Ok(Json(json!({
        "success": true,
        "message": "OTP has been sent to your email.",
    })))
}

/// Check a submitted code and apply the purpose's state transition.
///
/// `login-2fa` is the only purpose that opens a session here; the others
/// answer with a message and leave the client to its follow-up step.
#[utoipa::path(
    post,
    path = "/auth/otp/verify/{purpose}",
    request_body = OtpVerifyRequest,
    params(
        ("purpose" = String, Path, description = "One of confirm-account, password-reset, 2fa-toggle, login-2fa, security-recovery")
    ),
    responses(
        (status = 200, description = "Code accepted"),
        (status = 401, description = "Wrong code, or a code that was never issued"),
        (status = 404, description = "Unknown purpose or unknown email"),
        (status = 410, description = "Code expired")
    ),
    tag = "auth"
)]
pub async fn verify(
    Path(purpose): Path<String>,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<OtpVerifyRequest>>,
) -> Result<Response, ApiError> {
    let purpose = parse_purpose(&purpose)?;
    let request = require_payload(payload, "a request body")?;

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }
    let submitted = request.otp.trim();
    if submitted.is_empty() {
        return Err(ApiError::MissingField("otp"));
    }

    let mut user = user_store::find_by_email(&pool, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    otp::verify(&mut user.verification, purpose, submitted, Utc::now())?;
    user_store::save(&pool, &user).await?;

    let response = match purpose {
        Purpose::ConfirmAccount => Json(json!({
            "success": true,
            "message": "Your account has been verified.",
        }))
        .into_response(),
        Purpose::PasswordReset | Purpose::SecurityRecovery => Json(json!({
            "success": true,
            "message": "OTP verified. You may now set a new password.",
        }))
        .into_response(),
        Purpose::TwoFactorToggle => {
            let message = if user.verification.two_factor_enabled {
                "Two-factor authentication has been enabled."
            } else {
                "Two-factor authentication has been disabled."
            };
            Json(json!({ "success": true, "message": message })).into_response()
        }
        Purpose::LoginTwoFactor => {
            let token = session::issue(user.id, config.token_secret())?;
            let cookie = session::session_cookie(&token, config.environment())
                .context("failed to build session cookie")?;

            let mut response = Json(json!({
                "success": true,
                "message": "Login successful.",
                "user": SessionUser::from(&user),
            }))
            .into_response();
            response.headers_mut().insert(SET_COOKIE, cookie);
            response
        }
    };

    Ok(response)
}
