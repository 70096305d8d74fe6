//! Security questions: the recovery challenge alternative to mailed codes.

use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::handlers::current_user;
use crate::security;
use crate::store::users::{self as user_store};

use super::types::{SecurityQuestionsCheckRequest, SecurityQuestionsGetRequest, SecurityQuestionsSetRequest};
use super::{normalize_email, require_payload, AuthConfig};

/// Replace the logged-in user's security questions.
#[utoipa::path(
    post,
    path = "/auth/security-questions/set",
    request_body = SecurityQuestionsSetRequest,
    responses(
        (status = 200, description = "Questions stored"),
        (status = 400, description = "Missing or empty questions"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn set(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<SecurityQuestionsSetRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload, "a request body")?;
    if request.questions.is_empty() {
        return Err(ApiError::MissingField("security questions"));
    }
    if request
        .questions
        .iter()
        .any(|pair| pair.question.trim().is_empty() || pair.answer.trim().is_empty())
    {
        return Err(ApiError::MissingField("an answer for every question"));
    }

    let mut user = current_user(&pool, &headers, &config).await?;

    user.security_questions = security::set_questions(&request.questions)?;
    user.verification.has_security_questions = true;
    user_store::save(&pool, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Security questions have been saved.",
    })))
}

/// The stored question texts for an account, answers excluded.
#[utoipa::path(
    post,
    path = "/auth/security-questions/get",
    request_body = SecurityQuestionsGetRequest,
    responses(
        (status = 200, description = "Question texts"),
        (status = 400, description = "Missing field"),
        (status = 404, description = "Unknown email")
    ),
    tag = "auth"
)]
pub async fn get(
    pool: Extension<PgPool>,
    payload: Option<Json<SecurityQuestionsGetRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload, "a request body")?;

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }

    let user = user_store::find_by_email(&pool, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let questions: Vec<&str> = user
        .security_questions
        .iter()
        .map(|question| question.question.as_str())
        .collect();

    Ok(Json(json!({
        "success": true,
        "questions": questions,
    })))
}

/// Run the full challenge; all stored questions must be answered correctly.
#[utoipa::path(
    post,
    path = "/auth/security-questions/check",
    request_body = SecurityQuestionsCheckRequest,
    responses(
        (status = 200, description = "Challenge passed"),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Challenge failed"),
        (status = 404, description = "Unknown email")
    ),
    tag = "auth"
)]
pub async fn check(
    pool: Extension<PgPool>,
    payload: Option<Json<SecurityQuestionsCheckRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload, "a request body")?;

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }

    let user = user_store::find_by_email(&pool, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    if !security::check_answers(&user.security_questions, &request.answers) {
        return Err(ApiError::InvalidCredential(
            "Security answers are incorrect.".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Security answers verified. You may now set a new password.",
    })))
}
