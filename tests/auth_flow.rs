//! End-to-end verification flows over the domain types.
//!
//! These cover the account lifecycle without a database: registration state,
//! confirm-account verification, and the two-factor login gate.

use chrono::{Duration, Utc};
use crunchy::otp::{self, OtpError, Purpose};
use crunchy::password;
use crunchy::security::{self, SubmittedAnswer};
use crunchy::store::users::User;

fn register(name: &str, email: &str, pass: &str) -> (User, String) {
    let hash = password::hash(pass).expect("hashing succeeds");
    let mut user = User::new(name.to_string(), email.to_string(), hash);
    let code = otp::issue(&mut user.verification, Purpose::ConfirmAccount, Utc::now())
        .expect("fresh accounts can always be issued a confirmation code");
    (user, code)
}

#[test]
fn register_then_confirm_account() {
    let (mut user, code) = register("Alice", "alice@example.com", "hunter22");
    assert!(!user.verification.is_verified);

    otp::verify(&mut user.verification, Purpose::ConfirmAccount, &code, Utc::now())
        .expect("the mailed code verifies");
    assert!(user.verification.is_verified);

    // The code is consumed; replaying it fails and the flag stays set.
    let replay = otp::verify(&mut user.verification, Purpose::ConfirmAccount, &code, Utc::now());
    assert_eq!(replay, Err(OtpError::InvalidCode));
    assert!(user.verification.is_verified);
}

#[test]
fn confirmed_accounts_cannot_request_another_confirmation() {
    let (mut user, code) = register("Alice", "alice@example.com", "hunter22");
    otp::verify(&mut user.verification, Purpose::ConfirmAccount, &code, Utc::now())
        .expect("the mailed code verifies");

    let again = otp::issue(&mut user.verification, Purpose::ConfirmAccount, Utc::now());
    assert_eq!(again, Err(OtpError::AlreadyVerified));
}

#[test]
fn two_factor_login_requires_the_mailed_code() {
    let (mut user, code) = register("Alice", "alice@example.com", "hunter22");
    otp::verify(&mut user.verification, Purpose::ConfirmAccount, &code, Utc::now())
        .expect("the mailed code verifies");

    // Enable the second factor through its own OTP round.
    let toggle = otp::issue(&mut user.verification, Purpose::TwoFactorToggle, Utc::now())
        .expect("toggle code issues");
    otp::verify(&mut user.verification, Purpose::TwoFactorToggle, &toggle, Utc::now())
        .expect("toggle code verifies");
    assert!(user.verification.two_factor_enabled);

    // Password login now issues a login code instead of a session. Until that
    // code verifies, no login-2fa approval exists.
    let login_code = otp::issue(&mut user.verification, Purpose::LoginTwoFactor, Utc::now())
        .expect("login code issues");
    assert!(!user.verification.slot(Purpose::LoginTwoFactor).is_empty());

    // Generated codes are in the 6-digit range, so this can never match.
    let wrong = otp::verify(&mut user.verification, Purpose::LoginTwoFactor, "000000", Utc::now());
    assert_eq!(wrong, Err(OtpError::InvalidCode));

    otp::verify(
        &mut user.verification,
        Purpose::LoginTwoFactor,
        &login_code,
        Utc::now(),
    )
    .expect("the mailed login code verifies");
    assert!(user.verification.slot(Purpose::LoginTwoFactor).is_empty());
}

#[test]
fn expired_password_reset_code_stays_in_place() {
    let (mut user, _) = register("Alice", "alice@example.com", "hunter22");

    let issued_at = Utc::now();
    let code = otp::issue(&mut user.verification, Purpose::PasswordReset, issued_at)
        .expect("reset code issues");

    // Password-reset codes live 15 minutes.
    let late = issued_at + Duration::minutes(16);
    let result = otp::verify(&mut user.verification, Purpose::PasswordReset, &code, late);
    assert_eq!(result, Err(OtpError::Expired));
    assert!(!user.verification.slot(Purpose::PasswordReset).is_empty());
}

#[test]
fn security_question_recovery_is_all_or_nothing() {
    let (mut user, _) = register("Alice", "alice@example.com", "hunter22");

    let selected = vec![
        SubmittedAnswer {
            question: "First pet?".to_string(),
            answer: "Rex".to_string(),
        },
        SubmittedAnswer {
            question: "First street?".to_string(),
            answer: "Elm".to_string(),
        },
    ];
    user.security_questions = security::set_questions(&selected).expect("hashing succeeds");
    user.verification.has_security_questions = true;

    assert!(security::check_answers(&user.security_questions, &selected));

    let partial = vec![SubmittedAnswer {
        question: "First pet?".to_string(),
        answer: "Rex".to_string(),
    }];
    assert!(!security::check_answers(&user.security_questions, &partial));
}
