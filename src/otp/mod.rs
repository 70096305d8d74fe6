//! One-time-code issue/verify state machine.
//!
//! Every user carries one [`OtpSlot`] per [`Purpose`]. Issuing overwrites the
//! slot (implicit invalidation of any unconsumed code), verification is
//! single-use, and expiry is checked lazily at verification time. Purpose
//! isolation is structural: the purpose-to-slot mapping is an enum match, so
//! a code issued for one flow cannot be consumed by another.

use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};

mod purpose;

pub use purpose::Purpose;

/// One purpose's stored code and expiry. Empty code + no expiry is the idle
/// state, both after issue-then-verify and before any issue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpSlot {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl OtpSlot {
    fn clear(&mut self) {
        self.code.clear();
        self.expires_at = None;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// The verification block of a user document: account flags plus one OTP
/// slot per purpose.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VerificationState {
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub two_factor_enabled: bool,
    #[serde(default)]
    pub has_security_questions: bool,
    #[serde(default)]
    confirm_account: OtpSlot,
    #[serde(default)]
    password_reset: OtpSlot,
    #[serde(default)]
    two_factor_toggle: OtpSlot,
    #[serde(default)]
    login_two_factor: OtpSlot,
    #[serde(default)]
    security_recovery: OtpSlot,
}

impl VerificationState {
    #[must_use]
    pub fn slot(&self, purpose: Purpose) -> &OtpSlot {
        match purpose {
            Purpose::ConfirmAccount => &self.confirm_account,
            Purpose::PasswordReset => &self.password_reset,
            Purpose::TwoFactorToggle => &self.two_factor_toggle,
            Purpose::LoginTwoFactor => &self.login_two_factor,
            Purpose::SecurityRecovery => &self.security_recovery,
        }
    }

    fn slot_mut(&mut self, purpose: Purpose) -> &mut OtpSlot {
        match purpose {
            Purpose::ConfirmAccount => &mut self.confirm_account,
            Purpose::PasswordReset => &mut self.password_reset,
            Purpose::TwoFactorToggle => &mut self.two_factor_toggle,
            Purpose::LoginTwoFactor => &mut self.login_two_factor,
            Purpose::SecurityRecovery => &mut self.security_recovery,
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("You are already verified.")]
    AlreadyVerified,
    #[error("Invalid OTP.")]
    InvalidCode,
    #[error("The OTP has expired.")]
    Expired,
}

/// Generate a 6-digit code from the OS random source, uniform over the
/// 6-digit range.
#[must_use]
pub fn generate_code() -> String {
    let mut rng = OsRng;
    rng.gen_range(100_000..=999_999u32).to_string()
}

/// Issue a new code for `purpose`, overwriting any unconsumed one.
///
/// The caller persists the state and delivers the code out of band; delivery
/// failure does not invalidate the code.
///
/// # Errors
/// `AlreadyVerified` when asked to confirm an account that already is.
pub fn issue(
    state: &mut VerificationState,
    purpose: Purpose,
    now: DateTime<Utc>,
) -> Result<String, OtpError> {
    if purpose == Purpose::ConfirmAccount && state.is_verified {
        return Err(OtpError::AlreadyVerified);
    }

    let code = generate_code();
    let slot = state.slot_mut(purpose);
    slot.code = code.clone();
    slot.expires_at = Some(now + purpose.validity());
    Ok(code)
}

/// Check `submitted` against the stored code for `purpose` and, on success,
/// consume the slot and apply the purpose's state transition.
///
/// # Errors
/// - `InvalidCode` when the slot is empty (never issued or already consumed)
///   or the code does not match.
/// - `Expired` when the stored expiry has passed; the code is intentionally
///   left in place so the retention is observable.
pub fn verify(
    state: &mut VerificationState,
    purpose: Purpose,
    submitted: &str,
    now: DateTime<Utc>,
) -> Result<(), OtpError> {
    let slot = state.slot_mut(purpose);

    if slot.code.is_empty() || slot.code != submitted {
        return Err(OtpError::InvalidCode);
    }

    match slot.expires_at {
        Some(expires_at) if expires_at < now => return Err(OtpError::Expired),
        Some(_) => {}
        // A code without an expiry should not exist; treat it as consumed.
        None => return Err(OtpError::InvalidCode),
    }

    slot.clear();

    match purpose {
        Purpose::ConfirmAccount => state.is_verified = true,
        Purpose::TwoFactorToggle => state.two_factor_enabled = !state.two_factor_enabled,
        // The remaining purposes only signal the caller: password-reset and
        // security-recovery proceed to their own follow-up step, login-2fa
        // lets session issuance go ahead.
        Purpose::PasswordReset | Purpose::LoginTwoFactor | Purpose::SecurityRecovery => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{generate_code, issue, verify, OtpError, Purpose, VerificationState};
    use chrono::{Duration, Utc};

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..64 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn issue_then_verify_succeeds_exactly_once() {
        let now = Utc::now();
        for purpose in Purpose::ALL {
            let mut state = VerificationState::default();
            let code = issue(&mut state, purpose, now).unwrap();

            assert_eq!(verify(&mut state, purpose, &code, now), Ok(()));
            // Second attempt with the same code: slot was consumed.
            assert_eq!(
                verify(&mut state, purpose, &code, now),
                Err(OtpError::InvalidCode)
            );
        }
    }

    #[test]
    fn reissue_invalidates_previous_code() {
        let now = Utc::now();
        let mut state = VerificationState::default();
        let old = issue(&mut state, Purpose::PasswordReset, now).unwrap();
        let new = issue(&mut state, Purpose::PasswordReset, now).unwrap();

        if old != new {
            assert_eq!(
                verify(&mut state, Purpose::PasswordReset, &old, now),
                Err(OtpError::InvalidCode)
            );
        }
        assert_eq!(verify(&mut state, Purpose::PasswordReset, &new, now), Ok(()));
    }

    #[test]
    fn purposes_never_cross_validate() {
        let now = Utc::now();
        let mut state = VerificationState::default();
        let reset_code = issue(&mut state, Purpose::PasswordReset, now).unwrap();

        // A valid reset code must not satisfy any other purpose's check.
        for purpose in Purpose::ALL {
            if purpose == Purpose::PasswordReset {
                continue;
            }
            assert_eq!(
                verify(&mut state, purpose, &reset_code, now),
                Err(OtpError::InvalidCode),
                "{} accepted a password-reset code",
                purpose.as_slug()
            );
        }

        // And none of those failed checks consumed the reset slot.
        assert_eq!(
            verify(&mut state, Purpose::PasswordReset, &reset_code, now),
            Ok(())
        );
    }

    #[test]
    fn expired_code_fails_and_is_retained() {
        let now = Utc::now();
        let mut state = VerificationState::default();
        let code = issue(&mut state, Purpose::ConfirmAccount, now).unwrap();

        let later = now + Duration::hours(25);
        assert_eq!(
            verify(&mut state, Purpose::ConfirmAccount, &code, later),
            Err(OtpError::Expired)
        );
        // Expiry does not clear the slot.
        assert_eq!(state.slot(Purpose::ConfirmAccount).code, code);
        assert!(!state.is_verified);
    }

    #[test]
    fn reset_window_is_fifteen_minutes() {
        let now = Utc::now();
        let mut state = VerificationState::default();
        let code = issue(&mut state, Purpose::PasswordReset, now).unwrap();

        assert_eq!(
            verify(
                &mut state,
                Purpose::PasswordReset,
                &code,
                now + Duration::minutes(16)
            ),
            Err(OtpError::Expired)
        );
    }

    #[test]
    fn confirm_account_sets_verified_and_stays_set() {
        let now = Utc::now();
        let mut state = VerificationState::default();
        let code = issue(&mut state, Purpose::ConfirmAccount, now).unwrap();
        verify(&mut state, Purpose::ConfirmAccount, &code, now).unwrap();
        assert!(state.is_verified);

        // No further issue for confirm-account once verified.
        assert_eq!(
            issue(&mut state, Purpose::ConfirmAccount, now),
            Err(OtpError::AlreadyVerified)
        );

        // Other flows leave the flag alone.
        let code = issue(&mut state, Purpose::TwoFactorToggle, now).unwrap();
        verify(&mut state, Purpose::TwoFactorToggle, &code, now).unwrap();
        assert!(state.is_verified);
    }

    #[test]
    fn two_factor_toggle_flips_both_ways() {
        let now = Utc::now();
        let mut state = VerificationState::default();

        let code = issue(&mut state, Purpose::TwoFactorToggle, now).unwrap();
        verify(&mut state, Purpose::TwoFactorToggle, &code, now).unwrap();
        assert!(state.two_factor_enabled);

        let code = issue(&mut state, Purpose::TwoFactorToggle, now).unwrap();
        verify(&mut state, Purpose::TwoFactorToggle, &code, now).unwrap();
        assert!(!state.two_factor_enabled);
    }

    #[test]
    fn verify_without_issue_is_invalid() {
        let now = Utc::now();
        let mut state = VerificationState::default();
        assert_eq!(
            verify(&mut state, Purpose::LoginTwoFactor, "123456", now),
            Err(OtpError::InvalidCode)
        );
    }

    #[test]
    fn verification_state_survives_serde() {
        let now = Utc::now();
        let mut state = VerificationState::default();
        let code = issue(&mut state, Purpose::SecurityRecovery, now).unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let mut restored: VerificationState = serde_json::from_str(&json).unwrap();
        assert_eq!(
            verify(&mut restored, Purpose::SecurityRecovery, &code, now),
            Ok(())
        );
    }
}
