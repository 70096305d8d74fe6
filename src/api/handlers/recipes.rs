//! Recipe catalog handlers.

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
use crate::store::recipes::{
    self as recipe_store, sort_comments, Comment, CommentKind, ContentSort, CookingTime,
    DifficultyLevel, Ingredient, PortionSize, Recipe, RecipeImage, Reply,
};
use crate::store::users::{self as user_store};
use crate::store::{toggle_membership, Author};

use super::auth::AuthConfig;

#[derive(ToSchema, Deserialize, Debug)]
pub struct RecipeCreateRequest {
    pub recipe_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<RecipeImage>,
    #[serde(default)]
    pub cooking_time: CookingTime,
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,
    #[serde(default)]
    pub portion_size: PortionSize,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub nutrition: serde_json::Value,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub cooking_instructions: Vec<String>,
    #[serde(default)]
    pub meal_type: Vec<String>,
    #[serde(default)]
    pub dietary_preference: Vec<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct RecipeDeleteRequest {
    pub recipe_id: Uuid,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct RecipeIdsRequest {
    pub recipe_ids: Vec<Uuid>,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct RecipeViewRequest {
    pub sort: Option<ContentSort>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct CommentRequest {
    pub kind: CommentKind,
    pub text: String,
    pub rating: Option<u8>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ReplyRequest {
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

async fn load_recipe(pool: &PgPool, recipe_id: Uuid) -> Result<Recipe, ApiError> {
    recipe_store::find_by_id(pool, recipe_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found.".to_string()))
}

fn find_comment_mut(recipe: &mut Recipe, content_id: Uuid) -> Option<&mut Comment> {
    recipe
        .questions
        .iter_mut()
        .chain(recipe.reviews.iter_mut())
        .find(|comment| comment.id == content_id)
}

/// Publish a new recipe under the logged-in user.
#[utoipa::path(
    post,
    path = "/recipe",
    request_body = RecipeCreateRequest,
    responses(
        (status = 201, description = "Recipe created"),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "recipe"
)]
pub async fn create(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<RecipeCreateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let name = request.recipe_name.trim();
    if name.is_empty() {
        return Err(ApiError::MissingField("recipe name"));
    }

    let mut user = current_user(&pool, &headers, &config).await?;

    let recipe = Recipe {
        id: Uuid::new_v4(),
        recipe_name: name.to_string(),
        author: Author {
            user_id: user.id,
            username: user.name.clone(),
        },
        description: request.description,
        images: request.images,
        cooking_time: request.cooking_time,
        difficulty_level: request.difficulty_level,
        portion_size: request.portion_size,
        nutrition: request.nutrition,
        ingredients: request.ingredients,
        cooking_instructions: request.cooking_instructions,
        meal_type: request.meal_type,
        dietary_preference: request.dietary_preference,
        rating: Vec::new(),
        questions: Vec::new(),
        reviews: Vec::new(),
        created_at: chrono::Utc::now(),
    };

    recipe_store::insert(&pool, &recipe).await?;
    user.recipes.uploaded.push(recipe.id);
    user_store::save(&pool, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Recipe created.",
            "recipe_id": recipe.id,
        })),
    ))
}

/// Delete one of the logged-in user's own recipes.
#[utoipa::path(
    post,
    path = "/recipe/delete",
    request_body = RecipeDeleteRequest,
    responses(
        (status = 200, description = "Recipe deleted"),
        (status = 401, description = "Not authenticated or not the author"),
        (status = 404, description = "Unknown recipe")
    ),
    tag = "recipe"
)]
pub async fn delete(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<RecipeDeleteRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let mut user = current_user(&pool, &headers, &config).await?;
    let recipe = load_recipe(&pool, request.recipe_id).await?;

    if recipe.author.user_id != user.id {
        return Err(ApiError::InvalidCredential(
            "You can only delete your own recipes.".to_string(),
        ));
    }

    recipe_store::delete_by_id(&pool, recipe.id).await?;
    user.recipes.uploaded.retain(|id| *id != recipe.id);
    user_store::save(&pool, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Recipe deleted.",
    })))
}

/// A page of the catalog, newest first.
#[utoipa::path(
    get,
    path = "/recipe/all",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("skip" = Option<i64>, Query, description = "Offset, default 0")
    ),
    responses(
        (status = 200, description = "Recipes plus the total count")
    ),
    tag = "recipe"
)]
pub async fn all(
    Query(params): Query<PageParams>,
    pool: Extension<PgPool>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let skip = params.skip.unwrap_or(0).max(0);

    let (recipes, total) = recipe_store::list(&pool, limit, skip).await?;
    Ok(Json(json!({
        "success": true,
        "recipes": recipes,
        "total": total,
    })))
}

/// Recipes for a batch of ids; unknown ids are skipped.
#[utoipa::path(
    post,
    path = "/recipe/by-ids",
    request_body = RecipeIdsRequest,
    responses(
        (status = 200, description = "Recipes")
    ),
    tag = "recipe"
)]
pub async fn by_ids(
    pool: Extension<PgPool>,
    payload: Option<Json<RecipeIdsRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let recipes = recipe_store::find_many(&pool, &request.recipe_ids).await?;
    Ok(Json(json!({ "success": true, "recipes": recipes })))
}

/// One recipe, with its questions and reviews in the requested order.
#[utoipa::path(
    post,
    path = "/recipe/{recipe_id}",
    request_body = RecipeViewRequest,
    params(
        ("recipe_id" = Uuid, Path, description = "Recipe id")
    ),
    responses(
        (status = 200, description = "The recipe"),
        (status = 404, description = "Unknown recipe")
    ),
    tag = "recipe"
)]
pub async fn by_id(
    Path(recipe_id): Path<Uuid>,
    pool: Extension<PgPool>,
    payload: Option<Json<RecipeViewRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let sort = request.sort.unwrap_or(ContentSort::Newest);

    let mut recipe = load_recipe(&pool, recipe_id).await?;
    sort_comments(&mut recipe.questions, sort);
    sort_comments(&mut recipe.reviews, sort);

    Ok(Json(json!({ "success": true, "recipe": recipe })))
}

/// Add a question or a review. Reviews carry a 1-5 rating that also feeds
/// the recipe's rating list.
#[utoipa::path(
    post,
    path = "/recipe/{recipe_id}/comment",
    request_body = CommentRequest,
    params(
        ("recipe_id" = Uuid, Path, description = "Recipe id")
    ),
    responses(
        (status = 201, description = "Comment added"),
        (status = 400, description = "Missing text or rating"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown recipe")
    ),
    tag = "recipe"
)]
pub async fn comment(
    Path(recipe_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<CommentRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::MissingField("text"));
    }

    let rating = match (request.kind, request.rating) {
        (CommentKind::Review, Some(rating)) if (1..=5).contains(&rating) => Some(rating),
        (CommentKind::Review, _) => {
            return Err(ApiError::MissingField("a rating between 1 and 5"))
        }
        (CommentKind::Question, _) => None,
    };

    let user = current_user(&pool, &headers, &config).await?;
    let mut recipe = load_recipe(&pool, recipe_id).await?;

    let comment = Comment::new(
        Author {
            user_id: user.id,
            username: user.name,
        },
        text.to_string(),
        rating,
    );
    let comment_id = comment.id;

    if let Some(rating) = rating {
        recipe.rating.push(rating);
    }
    recipe.comments_mut(request.kind).push(comment);
    recipe_store::save(&pool, &recipe).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Comment added.",
            "content_id": comment_id,
        })),
    ))
}

/// Toggle the recipe in the viewer's favourites.
#[utoipa::path(
    post,
    path = "/recipe/{recipe_id}/favourite",
    params(
        ("recipe_id" = Uuid, Path, description = "Recipe id")
    ),
    responses(
        (status = 200, description = "Favourite state flipped"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown recipe")
    ),
    tag = "recipe"
)]
pub async fn favourite(
    Path(recipe_id): Path<Uuid>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = current_user(&pool, &headers, &config).await?;
    load_recipe(&pool, recipe_id).await?;

    let favourited = toggle_membership(&mut user.recipes.favourites, recipe_id);
    user_store::save(&pool, &user).await?;

    let message = if favourited {
        "Recipe added to favourites."
    } else {
        "Recipe removed from favourites."
    };
    Ok(Json(json!({ "success": true, "message": message, "favourited": favourited })))
}

/// Toggle the viewer's upvote on a question or review.
#[utoipa::path(
    post,
    path = "/recipe/{recipe_id}/content/{content_id}/like",
    params(
        ("recipe_id" = Uuid, Path, description = "Recipe id"),
        ("content_id" = Uuid, Path, description = "Question or review id")
    ),
    responses(
        (status = 200, description = "Upvote flipped"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown recipe or content")
    ),
    tag = "recipe"
)]
pub async fn like_content(
    Path((recipe_id, content_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = current_user(&pool, &headers, &config).await?;
    let mut recipe = load_recipe(&pool, recipe_id).await?;

    let comment = find_comment_mut(&mut recipe, content_id)
        .ok_or_else(|| ApiError::NotFound("Comment not found.".to_string()))?;
    let liked = toggle_membership(&mut comment.upvotes, user.id);
    recipe_store::save(&pool, &recipe).await?;

    let message = if liked { "Comment liked." } else { "Like removed." };
    Ok(Json(json!({ "success": true, "message": message, "liked": liked })))
}

/// Reply below a question or review.
#[utoipa::path(
    post,
    path = "/recipe/{recipe_id}/content/{content_id}/reply",
    request_body = ReplyRequest,
    params(
        ("recipe_id" = Uuid, Path, description = "Recipe id"),
        ("content_id" = Uuid, Path, description = "Question or review id")
    ),
    responses(
        (status = 201, description = "Reply added"),
        (status = 400, description = "Missing text"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown recipe or content")
    ),
    tag = "recipe"
)]
pub async fn reply_to_content(
    Path((recipe_id, content_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<ReplyRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = require_payload(payload)?;
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::MissingField("text"));
    }

    let user = current_user(&pool, &headers, &config).await?;
    let mut recipe = load_recipe(&pool, recipe_id).await?;

    let comment = find_comment_mut(&mut recipe, content_id)
        .ok_or_else(|| ApiError::NotFound("Comment not found.".to_string()))?;
    comment.replies.push(Reply {
        author: Author {
            user_id: user.id,
            username: user.name,
        },
        text: text.to_string(),
        created_at: chrono::Utc::now(),
    });
    recipe_store::save(&pool, &recipe).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Reply added." })),
    ))
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
    async fn create_missing_payload() -> anyhow::Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = create(
            HeaderMap::new(),
            Extension(pool),
            Extension(test_config()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn comment_requires_review_rating() -> anyhow::Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = comment(
            Path(Uuid::new_v4()),
            HeaderMap::new(),
            Extension(pool),
            Extension(test_config()),
            Some(Json(CommentRequest {
                kind: CommentKind::Review,
                text: "lovely".to_string(),
                rating: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn comment_rejects_out_of_range_rating() -> anyhow::Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = comment(
            Path(Uuid::new_v4()),
            HeaderMap::new(),
            Extension(pool),
            Extension(test_config()),
            Some(Json(CommentRequest {
                kind: CommentKind::Review,
                text: "lovely".to_string(),
                rating: Some(9),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
