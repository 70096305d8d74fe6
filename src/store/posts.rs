//! Feed post documents and the feed selection queries.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{query_span, Author};

/// A reply below a feed post.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PostReply {
    pub author: Author,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// One feed post with its embedded replies and upvoter list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author: Author,
    pub text: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub upvotes: Vec<Uuid>,
    #[serde(default)]
    pub replies: Vec<PostReply>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    #[must_use]
    pub fn new(author: Author, text: String, photos: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            text,
            photos,
            upvotes: Vec::new(),
            replies: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Which slice of the feed a listing returns. The variants carrying id lists
/// are resolved from the viewer's document before the query runs.
#[derive(Clone, Debug)]
pub enum FeedFilter {
    /// Every post, newest first.
    All,
    /// Every post, most upvoted first.
    Hot,
    /// Posts from the last 24 hours, newest first.
    New,
    /// Posts authored by the users the viewer follows.
    Following(Vec<Uuid>),
    /// The viewer's favourited posts.
    Saved(Vec<Uuid>),
    /// The posts the viewer has hidden.
    Hidden(Vec<Uuid>),
}

fn decode(doc: Value) -> Result<Post> {
    serde_json::from_value(doc).context("failed to decode post document")
}

fn encode(post: &Post) -> Result<Value> {
    serde_json::to_value(post).context("failed to encode post document")
}

fn decode_rows(rows: Vec<PgRow>) -> Result<Vec<Post>> {
    rows.into_iter().map(|row| decode(row.get("doc"))).collect()
}

/// # Errors
/// Returns an error on store failure.
pub async fn insert(pool: &PgPool, post: &Post) -> Result<()> {
    let query = "INSERT INTO posts (id, doc, created_at) VALUES ($1, $2, $3)";
    sqlx::query(query)
        .bind(post.id)
        .bind(encode(post)?)
        .bind(post.created_at)
        .execute(pool)
        .instrument(query_span("INSERT", query))
        .await
        .context("failed to insert post")?;
    Ok(())
}

/// # Errors
/// Returns an error on store failure.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Post>> {
    let query = "SELECT doc FROM posts WHERE id = $1";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to look up post")?;

    row.map(|row| decode(row.get("doc"))).transpose()
}

/// # Errors
/// Returns an error on store failure.
pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Post>> {
    let query = "SELECT doc FROM posts WHERE id = ANY($1)";
    let rows = sqlx::query(query)
        .bind(ids)
        .fetch_all(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to look up posts by ids")?;

    decode_rows(rows)
}

/// List a page of the posts a feed selection matches.
///
/// # Errors
/// Returns an error on store failure.
pub async fn list(pool: &PgPool, filter: &FeedFilter, limit: i64, skip: i64) -> Result<Vec<Post>> {
    let rows = match filter {
        FeedFilter::All => {
            let query = "SELECT doc FROM posts ORDER BY created_at DESC LIMIT $1 OFFSET $2";
            sqlx::query(query)
                .bind(limit)
                .bind(skip)
                .fetch_all(pool)
                .instrument(query_span("SELECT", query))
                .await
        }
        FeedFilter::Hot => {
            let query = "SELECT doc FROM posts \
                         ORDER BY jsonb_array_length(doc->'upvotes') DESC, created_at DESC \
                         LIMIT $1 OFFSET $2";
            sqlx::query(query)
                .bind(limit)
                .bind(skip)
                .fetch_all(pool)
                .instrument(query_span("SELECT", query))
                .await
        }
        FeedFilter::New => {
            let query = "SELECT doc FROM posts WHERE created_at >= $1 \
                         ORDER BY created_at DESC LIMIT $2 OFFSET $3";
            sqlx::query(query)
                .bind(Utc::now() - Duration::hours(24))
                .bind(limit)
                .bind(skip)
                .fetch_all(pool)
                .instrument(query_span("SELECT", query))
                .await
        }
        FeedFilter::Following(authors) => {
            let authors: Vec<String> = authors.iter().map(Uuid::to_string).collect();
            let query = "SELECT doc FROM posts \
                         WHERE doc->'author'->>'user_id' = ANY($1) \
                         ORDER BY created_at DESC LIMIT $2 OFFSET $3";
            sqlx::query(query)
                .bind(&authors)
                .bind(limit)
                .bind(skip)
                .fetch_all(pool)
                .instrument(query_span("SELECT", query))
                .await
        }
        FeedFilter::Saved(ids) | FeedFilter::Hidden(ids) => {
            let query = "SELECT doc FROM posts WHERE id = ANY($1) \
                         ORDER BY created_at DESC LIMIT $2 OFFSET $3";
            sqlx::query(query)
                .bind(ids)
                .bind(limit)
                .bind(skip)
                .fetch_all(pool)
                .instrument(query_span("SELECT", query))
                .await
        }
    }
    .context("failed to list feed posts")?;

    decode_rows(rows)
}

/// # Errors
/// Returns an error on store failure.
pub async fn save(pool: &PgPool, post: &Post) -> Result<()> {
    let query = "UPDATE posts SET doc = $2 WHERE id = $1";
    sqlx::query(query)
        .bind(post.id)
        .bind(encode(post)?)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to save post")?;
    Ok(())
}
