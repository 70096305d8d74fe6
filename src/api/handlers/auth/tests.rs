//! Auth handler tests for the validation paths that never reach the store.

use anyhow::Result;
use axum::extract::{Extension, Path};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::email::{LogMailSender, MailSender};
use crate::session::Environment;

use super::types::{
    LoginRequest, OtpVerifyRequest, RegisterRequest, SecurityQuestionsSetRequest,
};
use super::{login, otp, password, register, security_questions, session, AuthConfig};

fn pool() -> Result<PgPool> {
    Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
}

fn config() -> Arc<AuthConfig> {
    Arc::new(
        AuthConfig::new(
            "https://crunchy.dev".to_string(),
            SecretString::from("test-signing-secret"),
        )
        .with_environment(Environment::Development),
    )
}

fn mailer() -> Arc<dyn MailSender> {
    Arc::new(LogMailSender)
}

#[tokio::test]
async fn register_missing_payload() -> Result<()> {
    let response = register::register(
        Extension(pool()?),
        Extension(config()),
        Extension(mailer()),
        None,
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn register_rejects_blank_name() -> Result<()> {
    let response = register::register(
        Extension(pool()?),
        Extension(config()),
        Extension(mailer()),
        Some(Json(RegisterRequest {
            name: "  ".to_string(),
            email: "alice@example.com".to_string(),
            password: "hunter22".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn register_rejects_malformed_email() -> Result<()> {
    let response = register::register(
        Extension(pool()?),
        Extension(config()),
        Extension(mailer()),
        Some(Json(RegisterRequest {
            name: "Alice".to_string(),
            email: "not-an-email".to_string(),
            password: "hunter22".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_rejects_missing_password() -> Result<()> {
    let response = login::login(
        Extension(pool()?),
        Extension(config()),
        Extension(mailer()),
        Some(Json(LoginRequest {
            email: "alice@example.com".to_string(),
            password: String::new(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn otp_send_rejects_unknown_purpose() -> Result<()> {
    let response = otp::send(
        Path("confirm-email".to_string()),
        Extension(pool()?),
        Extension(config()),
        Extension(mailer()),
        None,
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn otp_verify_rejects_blank_code() -> Result<()> {
    let response = otp::verify(
        Path("confirm-account".to_string()),
        Extension(pool()?),
        Extension(config()),
        Some(Json(OtpVerifyRequest {
            email: "alice@example.com".to_string(),
            otp: "  ".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn session_check_requires_a_token() -> Result<()> {
    let response = session::get_session(HeaderMap::new(), Extension(pool()?), Extension(config()))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_clears_the_cookie() -> Result<()> {
    let response = session::logout(Extension(config())).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn password_reset_requires_a_session() -> Result<()> {
    let response = password::reset(
        HeaderMap::new(),
        Extension(pool()?),
        Extension(config()),
        Some(Json(super::types::PasswordResetRequest {
            old_password: "old".to_string(),
            new_password: "new".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn security_questions_set_rejects_empty_list() -> Result<()> {
    let response = security_questions::set(
        HeaderMap::new(),
        Extension(pool()?),
        Extension(config()),
        Some(Json(SecurityQuestionsSetRequest {
            questions: Vec::new(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
