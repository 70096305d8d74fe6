//! News-feed handlers.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::handlers::current_user;
use crate::store::posts::{self as post_store, FeedFilter, Post, PostReply};
use crate::store::users::{self as user_store, User};
use crate::store::{toggle_membership, Author};

use super::auth::AuthConfig;

#[derive(ToSchema, Deserialize, Debug)]
pub struct PostCreateRequest {
    pub text: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct PostIdsRequest {
    pub post_ids: Vec<Uuid>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct PostCommentRequest {
    pub text: String,
}

#[derive(Deserialize, Debug)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

fn require_payload<T>(payload: Option<Json<T>>) -> Result<T, ApiError> {
    match payload {
        Some(Json(payload)) => Ok(payload),
        None => Err(ApiError::MissingField("a request body")),
    }
}

fn feed_filter(slug: &str, viewer: &User) -> Result<FeedFilter, ApiError> {
    match slug {
        "all" => Ok(FeedFilter::All),
        "hot" => Ok(FeedFilter::Hot),
        "new" => Ok(FeedFilter::New),
        "following" => Ok(FeedFilter::Following(viewer.following.clone())),
        "saved" => Ok(FeedFilter::Saved(viewer.posts.favourites.clone())),
        "hidden" => Ok(FeedFilter::Hidden(viewer.posts.hidden.clone())),
        other => Err(ApiError::NotFound(format!("Unknown feed type: {other}."))),
    }
}

async fn load_post(pool: &PgPool, post_id: Uuid) -> Result<Post, ApiError> {
    post_store::find_by_id(pool, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found.".to_string()))
}

/// A page of one of the feed views.
#[utoipa::path(
    post,
    path = "/feed/posts/{feed_type}",
    params(
        ("feed_type" = String, Path, description = "One of all, hot, new, following, saved, hidden"),
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("skip" = Option<i64>, Query, description = "Offset, default 0")
    ),
    responses(
        (status = 200, description = "Posts for the feed view"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown feed type")
    ),
    tag = "feed"
)]
pub async fn posts(
    Path(feed_type): Path<String>,
    Query(params): Query<PageParams>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = current_user(&pool, &headers, &config).await?;
    let filter = feed_filter(&feed_type, &viewer)?;

    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let skip = params.skip.unwrap_or(0).max(0);

    let posts = post_store::list(&pool, &filter, limit, skip).await?;
    Ok(Json(json!({ "success": true, "posts": posts })))
}

/// Posts for a batch of ids; unknown ids are skipped.
#[utoipa::path(
    post,
    path = "/feed/by-ids",
    request_body = PostIdsRequest,
    responses(
        (status = 200, description = "Posts")
    ),
    tag = "feed"
)]
pub async fn by_ids(
    pool: Extension<PgPool>,
    payload: Option<Json<PostIdsRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let posts = post_store::find_many(&pool, &request.post_ids).await?;
    Ok(Json(json!({ "success": true, "posts": posts })))
}

/// Publish a post to the feed.
#[utoipa::path(
    post,
    path = "/feed/post",
    request_body = PostCreateRequest,
    responses(
        (status = 201, description = "Post created"),
        (status = 400, description = "Missing text"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "feed"
)]
pub async fn create_post(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<PostCreateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::MissingField("text"));
    }

    let mut user = current_user(&pool, &headers, &config).await?;
    let post = Post::new(
        Author {
            user_id: user.id,
            username: user.name.clone(),
        },
        text.to_string(),
        request.photos,
    );

    post_store::insert(&pool, &post).await?;
    user.posts.uploaded.push(post.id);
    user_store::save(&pool, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Post created.",
            "post_id": post.id,
        })),
    ))
}

/// Toggle the viewer's upvote on a post.
#[utoipa::path(
    post,
    path = "/feed/post/{post_id}/like",
    params(
        ("post_id" = Uuid, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Upvote flipped"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown post")
    ),
    tag = "feed"
)]
pub async fn like(
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = current_user(&pool, &headers, &config).await?;
    let mut post = load_post(&pool, post_id).await?;

    let liked = toggle_membership(&mut post.upvotes, user.id);
    post_store::save(&pool, &post).await?;

    let message = if liked { "Post liked." } else { "Like removed." };
    Ok(Json(json!({ "success": true, "message": message, "liked": liked })))
}

/// Reply below a post.
#[utoipa::path(
    post,
    path = "/feed/post/{post_id}/comment",
    request_body = PostCommentRequest,
    params(
        ("post_id" = Uuid, Path, description = "Post id")
    ),
    responses(
        (status = 201, description = "Reply added"),
        (status = 400, description = "Missing text"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown post")
    ),
    tag = "feed"
)]
pub async fn comment(
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<PostCommentRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::MissingField("text"));
    }

    let user = current_user(&pool, &headers, &config).await?;
    let mut post = load_post(&pool, post_id).await?;

    post.replies.push(PostReply {
        author: Author {
            user_id: user.id,
            username: user.name,
        },
        text: text.to_string(),
        created_at: chrono::Utc::now(),
    });
    post_store::save(&pool, &post).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Reply added." })),
    ))
}

/// Toggle the post in the viewer's saved list.
#[utoipa::path(
    post,
    path = "/feed/post/{post_id}/favourite",
    params(
        ("post_id" = Uuid, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Saved state flipped"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown post")
    ),
    tag = "feed"
)]
pub async fn favourite(
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = current_user(&pool, &headers, &config).await?;
    load_post(&pool, post_id).await?;

    let saved = toggle_membership(&mut user.posts.favourites, post_id);
    user_store::save(&pool, &user).await?;

    let message = if saved { "Post saved." } else { "Post unsaved." };
    Ok(Json(json!({ "success": true, "message": message, "saved": saved })))
}

/// Toggle the post in the viewer's hidden list.
#[utoipa::path(
    post,
    path = "/feed/post/{post_id}/hide",
    params(
        ("post_id" = Uuid, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Hidden state flipped"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown post")
    ),
    tag = "feed"
)]
pub async fn hide(
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = current_user(&pool, &headers, &config).await?;
    load_post(&pool, post_id).await?;

    let hidden = toggle_membership(&mut user.posts.hidden, post_id);
    user_store::save(&pool, &user).await?;

    let message = if hidden { "Post hidden." } else { "Post unhidden." };
    Ok(Json(json!({ "success": true, "message": message, "hidden": hidden })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn test_config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig::new(
            "https://crunchy.dev".to_string(),
            SecretString::from("test-signing-secret"),
        ))
    }

    #[tokio::test]
    async fn posts_requires_a_session() -> anyhow::Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = posts(
            Path("all".to_string()),
            Query(PageParams {
                limit: None,
                skip: None,
            }),
            HeaderMap::new(),
            Extension(pool),
            Extension(test_config()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn create_post_rejects_blank_text() -> anyhow::Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = create_post(
            HeaderMap::new(),
            Extension(pool),
            Extension(test_config()),
            Some(Json(PostCreateRequest {
                text: "  ".to_string(),
                photos: Vec::new(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
