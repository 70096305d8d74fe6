//! Password login, with the second factor gate when it is enabled.

use anyhow::Context;
use axum::{
    extract::Extension,
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
use crate::password;
use crate::session;
use crate::store::users::{self as user_store};

use super::types::{LoginRequest, SessionUser};
use super::{normalize_email, require_payload, send_otp_mail, AuthConfig};

/// Verify credentials and either open a session or demand the login code.
///
/// When the account has two-factor enabled the password match alone does not
/// produce a session cookie; the client must follow up with
/// `POST /auth/otp/verify/login-2fa`.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened, or login code sent when two-factor is on"),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Unknown email or wrong password")
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    mailer: Extension<Arc<dyn MailSender>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, ApiError> {
    let request = require_payload(payload, "a request body")?;

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }
    if request.password.is_empty() {
        return Err(ApiError::MissingField("password"));
    }

    let mut user = user_store::find_by_email(&pool, &email)
        .await?
        .ok_or_else(|| ApiError::InvalidCredential("Invalid email or password.".to_string()))?;

    if !password::verify(&request.password, &user.password_hash) {
        return Err(ApiError::InvalidCredential(
            "Invalid email or password.".to_string(),
        ));
    }

    if user.verification.two_factor_enabled {
        let code = otp::issue(&mut user.verification, Purpose::LoginTwoFactor, Utc::now())?;
        user_store::save(&pool, &user).await?;
        send_otp_mail(&config, &mailer, &user.email, Purpose::LoginTwoFactor, &code);

        return Ok(Json(json!({
            "success": true,
            "two_factor_enabled": true,
            "message": "A login code has been sent to your email.",
        }))
        .into_response());
    }

    let token = session::issue(user.id, config.token_secret())?;
    let cookie = session::session_cookie(&token, config.environment())
        .context("failed to build session cookie")?;

    let mut response = Json(json!({
        "success": true,
        "two_factor_enabled": false,
        "message": "Login successful.",
        "user": SessionUser::from(&user),
    }))
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}
