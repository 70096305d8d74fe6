//! Stateless session tokens and their cookie policy.
//!
//! A session is an HS256-signed token embedding the user id with a fixed
//! 7-day validity. Logout only clears the cookie; there is no server-side
//! revocation list, so a replayed token stays valid until its natural
//! expiry. Authentication checks decode the token and nothing else.

use anyhow::{anyhow, Context, Result};
use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "token";
pub const SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Deployment environment, driving cookie transport attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Sign a session token for `user_id`, valid for 7 days.
///
/// # Errors
/// Returns an error if signing fails.
pub fn issue(user_id: Uuid, secret: &SecretString) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(SESSION_TTL_SECONDS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .context("failed to sign session token")
}

/// Decode a session token back to its user id.
///
/// # Errors
/// Returns an error for a bad signature, malformed claims, or an expired
/// token; callers treat all of these as "not authenticated".
pub fn decode_user_id(token: &str, secret: &SecretString) -> Result<Uuid> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| anyhow!("invalid session token: {err}"))?;
    Uuid::parse_str(&data.claims.sub).context("session token subject is not a user id")
}

/// Build the `Set-Cookie` value carrying a fresh session token.
///
/// Production deployments serve a cross-site frontend, so the cookie is
/// `Secure; SameSite=None`; development keeps `SameSite=Strict`.
pub fn session_cookie(
    token: &str,
    environment: Environment,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; Max-Age={SESSION_TTL_SECONDS}"
    );
    cookie.push_str(cookie_attributes(environment));
    HeaderValue::from_str(&cookie)
}

/// Build the `Set-Cookie` value that clears the session cookie on logout.
pub fn clear_session_cookie(environment: Environment) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; Max-Age=0");
    cookie.push_str(cookie_attributes(environment));
    HeaderValue::from_str(&cookie)
}

fn cookie_attributes(environment: Environment) -> &'static str {
    match environment {
        Environment::Production => "; SameSite=None; Secure",
        Environment::Development => "; SameSite=Strict",
    }
}

/// Pull the session token from the request: `token` cookie first, bearer
/// header as a fallback for non-browser clients.
#[must_use]
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie_header) = headers.get(COOKIE) {
        if let Ok(value) = cookie_header.to_str() {
            for pair in value.split(';') {
                let mut parts = pair.trim().splitn(2, '=');
                let key = parts.next()?.trim();
                if key == SESSION_COOKIE_NAME {
                    if let Some(token) = parts.next() {
                        let token = token.trim();
                        if !token.is_empty() {
                            return Some(token.to_string());
                        }
                    }
                }
            }
        }
    }

    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .trim()
        .strip_prefix("Bearer ")
        .or_else(|| value.trim().strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
