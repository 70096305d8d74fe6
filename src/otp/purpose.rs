//! OTP purposes and their issue policies.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The flow an OTP is issued for. Each purpose owns exactly one slot on the
/// user's verification block; a code issued for one purpose can never satisfy
/// a check for another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    ConfirmAccount,
    PasswordReset,
    TwoFactorToggle,
    LoginTwoFactor,
    SecurityRecovery,
}

impl Purpose {
    pub const ALL: [Purpose; 5] = [
        Purpose::ConfirmAccount,
        Purpose::PasswordReset,
        Purpose::TwoFactorToggle,
        Purpose::LoginTwoFactor,
        Purpose::SecurityRecovery,
    ];

    /// Parse the path slug used by the OTP endpoints.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "confirm-account" => Some(Self::ConfirmAccount),
            "password-reset" => Some(Self::PasswordReset),
            "2fa-toggle" => Some(Self::TwoFactorToggle),
            "login-2fa" => Some(Self::LoginTwoFactor),
            "security-recovery" => Some(Self::SecurityRecovery),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_slug(self) -> &'static str {
        match self {
            Self::ConfirmAccount => "confirm-account",
            Self::PasswordReset => "password-reset",
            Self::TwoFactorToggle => "2fa-toggle",
            Self::LoginTwoFactor => "login-2fa",
            Self::SecurityRecovery => "security-recovery",
        }
    }

    /// How long a freshly issued code stays valid. Password resets get a
    /// short window; everything else is a day.
    #[must_use]
    pub fn validity(self) -> Duration {
        match self {
            Self::PasswordReset => Duration::minutes(15),
            _ => Duration::hours(24),
        }
    }

    #[must_use]
    pub fn email_subject(self) -> &'static str {
        match self {
            Self::ConfirmAccount => "Verify your account.",
            Self::PasswordReset => "Password reset OTP.",
            Self::TwoFactorToggle => "Two-factor authentication OTP.",
            Self::LoginTwoFactor => "Your login OTP.",
            Self::SecurityRecovery => "Account recovery OTP.",
        }
    }

    #[must_use]
    pub fn email_body(self, code: &str) -> String {
        match self {
            Self::PasswordReset => format!("Your OTP is {code}."),
            _ => format!(
                "Here is your 6 digit OTP {code}. Go back to the website and enter it there."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Purpose;
    use chrono::Duration;

    #[test]
    fn slug_round_trips_for_all_purposes() {
        for purpose in Purpose::ALL {
            assert_eq!(Purpose::from_slug(purpose.as_slug()), Some(purpose));
        }
    }

    #[test]
    fn unknown_slug_is_rejected() {
        assert_eq!(Purpose::from_slug("confirm_account"), None);
        assert_eq!(Purpose::from_slug(""), None);
    }

    #[test]
    fn password_reset_window_is_short() {
        assert_eq!(Purpose::PasswordReset.validity(), Duration::minutes(15));
        assert_eq!(Purpose::ConfirmAccount.validity(), Duration::hours(24));
        assert_eq!(Purpose::LoginTwoFactor.validity(), Duration::hours(24));
    }

    #[test]
    fn email_body_contains_code() {
        for purpose in Purpose::ALL {
            assert!(purpose.email_body("123456").contains("123456"));
        }
    }
}
