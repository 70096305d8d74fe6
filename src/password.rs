//! Password hashing primitive (Argon2id).
//!
//! Used for account passwords and for security-question answers; callers only
//! ever see the opaque hash string and the verify result.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use rand::rngs::OsRng;

/// Hash a secret into a self-describing PHC string.
///
/// # Errors
/// Returns an error if the hasher rejects its parameters.
pub fn hash(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash secret: {err}"))?
        .to_string();
    Ok(hash)
}

/// Verify a secret against a stored PHC hash. An unparseable hash counts as
/// a mismatch rather than an error so callers get a uniform boolean.
#[must_use]
pub fn verify(secret: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{hash, verify};

    #[test]
    fn hash_verify_round_trip() {
        let hashed = hash("pw123456").unwrap();
        assert!(verify("pw123456", &hashed));
        assert!(!verify("pw1234567", &hashed));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash("pw123456").unwrap();
        let second = hash("pw123456").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_hash_is_a_mismatch() {
        assert!(!verify("pw123456", "not-a-phc-string"));
        assert!(!verify("pw123456", ""));
    }

    #[test]
    fn answers_are_case_sensitive() {
        let hashed = hash("Rex").unwrap();
        assert!(verify("Rex", &hashed));
        assert!(!verify("rex", &hashed));
    }
}
