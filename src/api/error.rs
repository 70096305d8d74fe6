//! Uniform error envelope for every handler.
//!
//! Handlers return `Result<_, ApiError>`; each variant maps to one status
//! code, and the body always carries `{"success": false, "message": ...}` so
//! clients can branch on the status code alone.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::otp::OtpError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required request field is missing or empty.
    #[error("Please provide {0}.")]
    MissingField(&'static str),

    /// The referenced document does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Authentication or a submitted proof failed.
    #[error("{0}")]
    InvalidCredential(String),

    /// A code or token was valid once but its validity window has passed.
    #[error("{0}")]
    Expired(String),

    /// The request asks for a transition the document has already made.
    #[error("{0}")]
    AlreadyInState(String),

    /// The store or another internal dependency failed.
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            Self::Expired(_) => StatusCode::GONE,
            Self::AlreadyInState(_) => StatusCode::CONFLICT,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::AlreadyVerified => Self::AlreadyInState(err.to_string()),
            OtpError::InvalidCode => Self::InvalidCredential(err.to_string()),
            OtpError::Expired => Self::Expired(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Persistence(err) => {
                tracing::error!("internal error: {err:#}");
                "Something went wrong.".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::ApiError;
    use crate::otp::OtpError;
    use axum::http::StatusCode;

    #[test]
    fn each_variant_maps_to_one_status() {
        assert_eq!(
            ApiError::MissingField("email").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("User not found.".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InvalidCredential("Invalid OTP.".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Expired("The OTP has expired.".to_string()).status(),
            StatusCode::GONE
        );
        assert_eq!(
            ApiError::AlreadyInState("Already verified.".to_string()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Persistence(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn otp_errors_keep_their_messages() {
        let err = ApiError::from(OtpError::InvalidCode);
        assert_eq!(err.to_string(), "Invalid OTP.");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = ApiError::from(OtpError::Expired);
        assert_eq!(err.status(), StatusCode::GONE);

        let err = ApiError::from(OtpError::AlreadyVerified);
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn missing_field_message_names_the_field() {
        assert_eq!(
            ApiError::MissingField("email").to_string(),
            "Please provide email."
        );
    }
}
