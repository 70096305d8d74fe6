//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::security::SubmittedAnswer;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpSendRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub otp: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PasswordResetRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PasswordSetRequest {
    pub email: String,
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CheckInformationRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SecurityQuestionsSetRequest {
    pub questions: Vec<SubmittedAnswer>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SecurityQuestionsGetRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SecurityQuestionsCheckRequest {
    pub email: String,
    pub answers: Vec<SubmittedAnswer>,
}

/// The user fields returned to the client after login or a session check.
#[derive(ToSchema, Serialize, Debug)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    pub two_factor_enabled: bool,
}

impl From<&crate::store::users::User> for SessionUser {
    fn from(user: &crate::store::users::User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_verified: user.verification.is_verified,
            two_factor_enabled: user.verification.two_factor_enabled,
        }
    }
}
