//! User documents and their store operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{is_unique_violation, query_span};
use crate::otp::VerificationState;
use crate::security::SecurityQuestion;

#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Pictures {
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub cover: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Phone {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub number: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SocialLinks {
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub youtube: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecipeRefs {
    #[serde(default)]
    pub uploaded: Vec<Uuid>,
    #[serde(default)]
    pub favourites: Vec<Uuid>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PostRefs {
    #[serde(default)]
    pub uploaded: Vec<Uuid>,
    #[serde(default)]
    pub favourites: Vec<Uuid>,
    #[serde(default)]
    pub hidden: Vec<Uuid>,
}

/// One registered identity: credentials, verification state, profile, and
/// the id lists tying the user to content and to other users.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: Phone,
    #[serde(default)]
    pub pictures: Pictures,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub verification: VerificationState,
    #[serde(default)]
    pub security_questions: Vec<SecurityQuestion>,
    #[serde(default)]
    pub following: Vec<Uuid>,
    #[serde(default)]
    pub recipes: RecipeRefs,
    #[serde(default)]
    pub posts: PostRefs,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh registration: everything except identity starts empty/false.
    #[must_use]
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            bio: String::new(),
            surname: String::new(),
            age: 0,
            gender: String::new(),
            country: String::new(),
            phone: Phone::default(),
            pictures: Pictures::default(),
            social_links: SocialLinks::default(),
            verification: VerificationState::default(),
            security_questions: Vec::new(),
            following: Vec::new(),
            recipes: RecipeRefs::default(),
            posts: PostRefs::default(),
            created_at: Utc::now(),
        }
    }
}

/// Outcome when inserting a new user document.
#[derive(Debug)]
pub enum InsertOutcome {
    Created,
    EmailTaken,
}

/// Lightweight projection for user listings.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub name: String,
    pub picture: String,
}

fn decode(doc: Value) -> Result<User> {
    serde_json::from_value(doc).context("failed to decode user document")
}

fn encode(user: &User) -> Result<Value> {
    serde_json::to_value(user).context("failed to encode user document")
}

/// Insert a new user, reporting an email conflict instead of erroring.
///
/// # Errors
/// Returns an error on store failure.
pub async fn insert(pool: &PgPool, user: &User) -> Result<InsertOutcome> {
    let query = "INSERT INTO users (id, email, doc) VALUES ($1, $2, $3)";
    let result = sqlx::query(query)
        .bind(user.id)
        .bind(&user.email)
        .bind(encode(user)?)
        .execute(pool)
        .instrument(query_span("INSERT", query))
        .await;

    match result {
        Ok(_) => Ok(InsertOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::EmailTaken),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// # Errors
/// Returns an error on store failure.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let query = "SELECT doc FROM users WHERE email = $1";
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to look up user by email")?;

    row.map(|row| decode(row.get("doc"))).transpose()
}

/// # Errors
/// Returns an error on store failure.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let query = "SELECT doc FROM users WHERE id = $1";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to look up user by id")?;

    row.map(|row| decode(row.get("doc"))).transpose()
}

/// # Errors
/// Returns an error on store failure.
pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<User>> {
    let query = "SELECT doc FROM users WHERE id = ANY($1)";
    let rows = sqlx::query(query)
        .bind(ids)
        .fetch_all(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to look up users by ids")?;

    rows.into_iter().map(|row| decode(row.get("doc"))).collect()
}

/// Everyone the given user does not already follow, excluding the user.
///
/// # Errors
/// Returns an error on store failure.
pub async fn list_suggestions(
    pool: &PgPool,
    user_id: Uuid,
    following: &[Uuid],
) -> Result<Vec<UserSummary>> {
    let mut excluded = following.to_vec();
    excluded.push(user_id);

    let query = "SELECT doc FROM users WHERE NOT (id = ANY($1))";
    let rows = sqlx::query(query)
        .bind(&excluded)
        .fetch_all(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to list user suggestions")?;

    rows.into_iter()
        .map(|row| {
            let user = decode(row.get("doc"))?;
            Ok(UserSummary {
                user_id: user.id,
                name: user.name,
                picture: user.pictures.profile,
            })
        })
        .collect()
}

/// Persist the full document. The email column is kept in sync so lookups
/// and the uniqueness constraint stay on the column.
///
/// # Errors
/// Returns an error on store failure.
pub async fn save(pool: &PgPool, user: &User) -> Result<()> {
    let query = "UPDATE users SET doc = $2, email = $3 WHERE id = $1";
    sqlx::query(query)
        .bind(user.id)
        .bind(encode(user)?)
        .bind(&user.email)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to save user")?;
    Ok(())
}

/// Delete the user document. Content authored by the user is left in place;
/// dangling references are an accepted gap.
///
/// # Errors
/// Returns an error on store failure.
pub async fn delete_by_id(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM users WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to delete user")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::User;

    #[test]
    fn new_user_starts_unverified_and_empty() {
        let user = User::new(
            "Alice".to_string(),
            "a@x.com".to_string(),
            "hash".to_string(),
        );
        assert!(!user.verification.is_verified);
        assert!(!user.verification.two_factor_enabled);
        assert!(user.security_questions.is_empty());
        assert!(user.following.is_empty());
        assert!(user.posts.hidden.is_empty());
    }

    #[test]
    fn user_document_round_trips_through_json() {
        let user = User::new(
            "Alice".to_string(),
            "a@x.com".to_string(),
            "hash".to_string(),
        );
        let doc = serde_json::to_value(&user).unwrap();
        let decoded: User = serde_json::from_value(doc).unwrap();
        assert_eq!(decoded.id, user.id);
        assert_eq!(decoded.email, "a@x.com");
        assert_eq!(decoded.password_hash, "hash");
    }

    #[test]
    fn legacy_documents_without_optional_fields_decode() {
        // Documents written before a field existed must still decode.
        let doc = serde_json::json!({
            "id": "7b7f3a4e-5f2d-4c3a-9e3b-2f1a6b8c9d0e",
            "name": "Bob",
            "email": "b@x.com",
            "password_hash": "hash",
            "created_at": "2025-03-01T00:00:00Z"
        });
        let user: User = serde_json::from_value(doc).unwrap();
        assert!(!user.verification.is_verified);
        assert!(user.recipes.uploaded.is_empty());
    }
}
