//! Account and verification handlers.
//!
//! Every mutating flow here is a single read-modify-write of one user
//! document: load by email or session, run the domain operation, save. OTP
//! mail leaves through the background sender and never delays the response.

pub(crate) mod login;
pub(crate) mod otp;
pub(crate) mod password;
pub(crate) mod register;
pub(crate) mod security_questions;
pub(crate) mod session;
mod state;
pub(crate) mod types;
mod utils;

use axum::Json;
use std::sync::Arc;

pub use state::AuthConfig;

use crate::api::email::{send_in_background, MailMessage, MailSender};
use crate::api::error::ApiError;
use crate::otp::Purpose;

pub(super) use utils::{normalize_email, valid_email};

/// Unwrap an optional JSON body, rejecting requests without one.
pub(super) fn require_payload<T>(
    payload: Option<Json<T>>,
    description: &'static str,
) -> Result<T, ApiError> {
    match payload {
        Some(Json(payload)) => Ok(payload),
        None => Err(ApiError::MissingField(description)),
    }
}

/// Queue the OTP mail for a purpose; delivery happens off the request path.
pub(super) fn send_otp_mail(
    config: &AuthConfig,
    sender: &Arc<dyn MailSender>,
    to: &str,
    purpose: Purpose,
    code: &str,
) {
    send_in_background(
        Arc::clone(sender),
        MailMessage {
            from: config.sender_email().to_string(),
            to: to.to_string(),
            subject: purpose.email_subject().to_string(),
            body: purpose.email_body(code),
        },
    );
}

#[cfg(test)]
mod tests;
