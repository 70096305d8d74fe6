//! User profile, follow, and account-management handlers.

use anyhow::Context;
use axum::{
    extract::{Extension, Path},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::handlers::{current_user, require_session};
use crate::session;
use crate::store::users::{self as user_store, User, UserSummary};
use crate::store::toggle_membership;

use super::auth::AuthConfig;

#[derive(ToSchema, Deserialize, Debug)]
pub struct UserIdsRequest {
    pub user_ids: Vec<Uuid>,
}

/// Profile fields a user may update; absent fields are left untouched.
#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub bio: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub phone: Option<crate::store::users::Phone>,
    pub social_links: Option<crate::store::users::SocialLinks>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct PictureRequest {
    pub url: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct PictureRemoveRequest {
    pub kind: String,
}

fn require_payload<T>(payload: Option<Json<T>>) -> Result<T, ApiError> {
    match payload {
        Some(Json(payload)) => Ok(payload),
        None => Err(ApiError::MissingField("a request body")),
    }
}

fn profile_json(user: &User) -> serde_json::Value {
    json!({
        "user_id": user.id,
        "name": user.name,
        "surname": user.surname,
        "email": user.email,
        "bio": user.bio,
        "age": user.age,
        "gender": user.gender,
        "country": user.country,
        "phone": user.phone,
        "pictures": user.pictures,
        "social_links": user.social_links,
        "is_verified": user.verification.is_verified,
        "two_factor_enabled": user.verification.two_factor_enabled,
        "has_security_questions": user.verification.has_security_questions,
        "following": user.following,
        "recipes": { "uploaded": user.recipes.uploaded, "favourites": user.recipes.favourites },
        "posts": {
            "uploaded": user.posts.uploaded,
            "favourites": user.posts.favourites,
            "hidden": user.posts.hidden,
        },
    })
}

/// The logged-in user's own profile.
#[utoipa::path(
    get,
    path = "/user/data",
    responses(
        (status = 200, description = "Profile of the session's user"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "user"
)]
pub async fn data(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = current_user(&pool, &headers, &config).await?;
    Ok(Json(json!({ "success": true, "user": profile_json(&user) })))
}

/// Follow suggestions: everyone the viewer does not already follow.
#[utoipa::path(
    post,
    path = "/user/all",
    responses(
        (status = 200, description = "User summaries", body = [UserSummary]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "user"
)]
pub async fn all(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = current_user(&pool, &headers, &config).await?;
    let users = user_store::list_suggestions(&pool, user.id, &user.following).await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// Summaries for a batch of user ids; unknown ids are skipped.
#[utoipa::path(
    post,
    path = "/user/by-ids",
    request_body = UserIdsRequest,
    responses(
        (status = 200, description = "User summaries", body = [UserSummary])
    ),
    tag = "user"
)]
pub async fn by_ids(
    pool: Extension<PgPool>,
    payload: Option<Json<UserIdsRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let users: Vec<UserSummary> = user_store::find_many(&pool, &request.user_ids)
        .await?
        .iter()
        .map(|user| UserSummary {
            user_id: user.id,
            name: user.name.clone(),
            picture: user.pictures.profile.clone(),
        })
        .collect();
    Ok(Json(json!({ "success": true, "users": users })))
}

/// A user's public profile by id.
#[utoipa::path(
    get,
    path = "/user/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Public profile"),
        (status = 404, description = "Unknown user")
    ),
    tag = "user"
)]
pub async fn by_id(
    Path(user_id): Path<Uuid>,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    let user = user_store::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;
    Ok(Json(json!({ "success": true, "user": profile_json(&user) })))
}

/// Delete the logged-in account. Authored content stays behind with
/// dangling author references.
#[utoipa::path(
    post,
    path = "/user/delete",
    responses(
        (status = 200, description = "Account deleted, session cookie cleared"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "user"
)]
pub async fn delete(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<Response, ApiError> {
    let user_id = require_session(&headers, &config)?;
    if !user_store::delete_by_id(&pool, user_id).await? {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }

    let cookie = session::clear_session_cookie(config.environment())
        .context("failed to build logout cookie")?;
    let mut response = Json(json!({
        "success": true,
        "message": "Your account has been deleted.",
    }))
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// Toggle following another user.
#[utoipa::path(
    post,
    path = "/user/follow/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User to follow or unfollow")
    ),
    responses(
        (status = 200, description = "Follow state flipped"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Attempt to follow yourself")
    ),
    tag = "user"
)]
pub async fn follow(
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = current_user(&pool, &headers, &config).await?;
    if user.id == user_id {
        return Err(ApiError::AlreadyInState(
            "You cannot follow yourself.".to_string(),
        ));
    }
    if user_store::find_by_id(&pool, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }

    let following = toggle_membership(&mut user.following, user_id);
    user_store::save(&pool, &user).await?;

    let message = if following {
        "User followed."
    } else {
        "User unfollowed."
    };
    Ok(Json(json!({ "success": true, "message": message, "following": following })))
}

/// Update profile fields; only the fields present in the body change.
#[utoipa::path(
    post,
    path = "/user/profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "user"
)]
pub async fn update_profile(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<ProfileUpdateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let mut user = current_user(&pool, &headers, &config).await?;

    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::MissingField("name"));
        }
        user.name = name;
    }
    if let Some(surname) = request.surname {
        user.surname = surname;
    }
    if let Some(bio) = request.bio {
        user.bio = bio;
    }
    if let Some(age) = request.age {
        user.age = age;
    }
    if let Some(gender) = request.gender {
        user.gender = gender;
    }
    if let Some(country) = request.country {
        user.country = country;
    }
    if let Some(phone) = request.phone {
        user.phone = phone;
    }
    if let Some(social_links) = request.social_links {
        user.social_links = social_links;
    }

    user_store::save(&pool, &user).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated.",
        "user": profile_json(&user),
    })))
}

/// Set the profile or cover picture URL.
#[utoipa::path(
    post,
    path = "/user/picture/{kind}",
    request_body = PictureRequest,
    params(
        ("kind" = String, Path, description = "Either profile or cover")
    ),
    responses(
        (status = 200, description = "Picture updated"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown picture kind")
    ),
    tag = "user"
)]
pub async fn set_picture(
    Path(kind): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<PictureRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let url = request.url.trim().to_string();
    if url.is_empty() {
        return Err(ApiError::MissingField("url"));
    }

    let mut user = current_user(&pool, &headers, &config).await?;
    match kind.as_str() {
        "profile" => user.pictures.profile = url,
        "cover" => user.pictures.cover = url,
        other => {
            return Err(ApiError::NotFound(format!(
                "Unknown picture kind: {other}."
            )))
        }
    }

    user_store::save(&pool, &user).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Picture updated.",
        "pictures": user.pictures,
    })))
}

/// Clear the profile or cover picture.
#[utoipa::path(
    post,
    path = "/user/picture/remove",
    request_body = PictureRemoveRequest,
    responses(
        (status = 200, description = "Picture removed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown picture kind")
    ),
    tag = "user"
)]
pub async fn remove_picture(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<PictureRemoveRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let mut user = current_user(&pool, &headers, &config).await?;

    match request.kind.as_str() {
        "profile" => user.pictures.profile.clear(),
        "cover" => user.pictures.cover.clear(),
        other => {
            return Err(ApiError::NotFound(format!(
                "Unknown picture kind: {other}."
            )))
        }
    }

    user_store::save(&pool, &user).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Picture removed.",
        "pictures": user.pictures,
    })))
}
