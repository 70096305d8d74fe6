//! Recipe documents: the catalog entries plus their embedded questions,
//! reviews, and replies.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{query_span, Author};

#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecipeImage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CookingTime {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub time: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DifficultyLevel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub difficulty: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PortionSize {
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Ingredient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub weight: String,
}

/// A reply below a question or review.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Reply {
    pub author: Author,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// An embedded question or review. Reviews carry a rating, questions do not.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Comment {
    pub id: Uuid,
    pub author: Author,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub upvotes: Vec<Uuid>,
    #[serde(default)]
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    #[must_use]
    pub fn new(author: Author, text: String, rating: Option<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            text,
            rating,
            upvotes: Vec::new(),
            replies: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Which embedded list a comment operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CommentKind {
    Question,
    Review,
}

/// Sort orders accepted for embedded questions/reviews.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
pub enum ContentSort {
    Oldest,
    Newest,
    #[serde(rename = "Most popular")]
    MostPopular,
    #[serde(rename = "Least popular")]
    LeastPopular,
}

/// Sort an embedded comment list in place.
pub fn sort_comments(comments: &mut [Comment], sort: ContentSort) {
    match sort {
        ContentSort::Oldest => comments.sort_by_key(|comment| comment.created_at),
        ContentSort::Newest => {
            comments.sort_by_key(|comment| std::cmp::Reverse(comment.created_at));
        }
        ContentSort::MostPopular => {
            comments.sort_by_key(|comment| std::cmp::Reverse(comment.upvotes.len()));
        }
        ContentSort::LeastPopular => comments.sort_by_key(|comment| comment.upvotes.len()),
    }
}

/// One catalog entry with its embedded discussion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub recipe_name: String,
    pub author: Author,
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
    pub nutrition: Value,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub cooking_instructions: Vec<String>,
    #[serde(default)]
    pub meal_type: Vec<String>,
    #[serde(default)]
    pub dietary_preference: Vec<String>,
    #[serde(default)]
    pub rating: Vec<u8>,
    #[serde(default)]
    pub questions: Vec<Comment>,
    #[serde(default)]
    pub reviews: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// The embedded list for a comment kind.
    pub fn comments_mut(&mut self, kind: CommentKind) -> &mut Vec<Comment> {
        match kind {
            CommentKind::Question => &mut self.questions,
            CommentKind::Review => &mut self.reviews,
        }
    }
}

fn decode(doc: Value) -> Result<Recipe> {
    serde_json::from_value(doc).context("failed to decode recipe document")
}

fn encode(recipe: &Recipe) -> Result<Value> {
    serde_json::to_value(recipe).context("failed to encode recipe document")
}

/// # Errors
/// Returns an error on store failure.
pub async fn insert(pool: &PgPool, recipe: &Recipe) -> Result<()> {
    let query = "INSERT INTO recipes (id, doc, created_at) VALUES ($1, $2, $3)";
    sqlx::query(query)
        .bind(recipe.id)
        .bind(encode(recipe)?)
        .bind(recipe.created_at)
        .execute(pool)
        .instrument(query_span("INSERT", query))
        .await
        .context("failed to insert recipe")?;
    Ok(())
}

/// # Errors
/// Returns an error on store failure.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Recipe>> {
    let query = "SELECT doc FROM recipes WHERE id = $1";
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to look up recipe")?;

    row.map(|row| decode(row.get("doc"))).transpose()
}

/// # Errors
/// Returns an error on store failure.
pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Recipe>> {
    let query = "SELECT doc FROM recipes WHERE id = ANY($1)";
    let rows = sqlx::query(query)
        .bind(ids)
        .fetch_all(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to look up recipes by ids")?;

    rows.into_iter().map(|row| decode(row.get("doc"))).collect()
}

/// A page of the catalog, newest first, plus the total count for paging.
///
/// # Errors
/// Returns an error on store failure.
pub async fn list(pool: &PgPool, limit: i64, skip: i64) -> Result<(Vec<Recipe>, i64)> {
    let query = "SELECT COUNT(*) AS total FROM recipes";
    let total: i64 = sqlx::query(query)
        .fetch_one(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to count recipes")?
        .get("total");

    let query = "SELECT doc FROM recipes ORDER BY created_at DESC LIMIT $1 OFFSET $2";
    let rows = sqlx::query(query)
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to list recipes")?;

    let recipes = rows
        .into_iter()
        .map(|row| decode(row.get("doc")))
        .collect::<Result<Vec<_>>>()?;
    Ok((recipes, total))
}

/// # Errors
/// Returns an error on store failure.
pub async fn save(pool: &PgPool, recipe: &Recipe) -> Result<()> {
    let query = "UPDATE recipes SET doc = $2 WHERE id = $1";
    sqlx::query(query)
        .bind(recipe.id)
        .bind(encode(recipe)?)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to save recipe")?;
    Ok(())
}

/// # Errors
/// Returns an error on store failure.
pub async fn delete_by_id(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM recipes WHERE id = $1";
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to delete recipe")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{sort_comments, Author, Comment, CommentKind, ContentSort, Recipe};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn author() -> Author {
        Author {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
        }
    }

    fn comment(age_minutes: i64, upvotes: usize) -> Comment {
        let mut comment = Comment::new(author(), "text".to_string(), None);
        comment.created_at = Utc::now() - Duration::minutes(age_minutes);
        comment.upvotes = (0..upvotes).map(|_| Uuid::new_v4()).collect();
        comment
    }

    #[test]
    fn sort_by_age_both_directions() {
        let mut comments = vec![comment(10, 0), comment(30, 0), comment(20, 0)];

        sort_comments(&mut comments, ContentSort::Oldest);
        assert!(comments[0].created_at <= comments[1].created_at);
        assert!(comments[1].created_at <= comments[2].created_at);

        sort_comments(&mut comments, ContentSort::Newest);
        assert!(comments[0].created_at >= comments[1].created_at);
    }

    #[test]
    fn sort_by_popularity() {
        let mut comments = vec![comment(0, 1), comment(0, 5), comment(0, 3)];

        sort_comments(&mut comments, ContentSort::MostPopular);
        assert_eq!(comments[0].upvotes.len(), 5);
        assert_eq!(comments[2].upvotes.len(), 1);

        sort_comments(&mut comments, ContentSort::LeastPopular);
        assert_eq!(comments[0].upvotes.len(), 1);
    }

    #[test]
    fn content_sort_accepts_display_names() {
        let sort: ContentSort = serde_json::from_str(r#""Most popular""#).unwrap();
        assert_eq!(sort, ContentSort::MostPopular);
        let sort: ContentSort = serde_json::from_str(r#""Oldest""#).unwrap();
        assert_eq!(sort, ContentSort::Oldest);
    }

    #[test]
    fn review_rating_is_optional_in_json() {
        let question = Comment::new(author(), "why".to_string(), None);
        let value = serde_json::to_value(&question).unwrap();
        assert!(value.get("rating").is_none());

        let review = Comment::new(author(), "good".to_string(), Some(5));
        let value = serde_json::to_value(&review).unwrap();
        assert_eq!(value.get("rating").and_then(serde_json::Value::as_u64), Some(5));
    }

    #[test]
    fn comments_mut_targets_the_kind_list() {
        let mut recipe = Recipe {
            id: Uuid::new_v4(),
            recipe_name: "Soup".to_string(),
            author: author(),
            description: String::new(),
            images: Vec::new(),
            cooking_time: Default::default(),
            difficulty_level: Default::default(),
            portion_size: Default::default(),
            nutrition: serde_json::Value::Null,
            ingredients: Vec::new(),
            cooking_instructions: Vec::new(),
            meal_type: Vec::new(),
            dietary_preference: Vec::new(),
            rating: Vec::new(),
            questions: Vec::new(),
            reviews: Vec::new(),
            created_at: Utc::now(),
        };

        recipe
            .comments_mut(CommentKind::Question)
            .push(comment(0, 0));
        recipe.comments_mut(CommentKind::Review).push(comment(0, 0));

        assert_eq!(recipe.questions.len(), 1);
        assert_eq!(recipe.reviews.len(), 1);
    }

    #[test]
    fn comment_kind_slugs() {
        let kind: CommentKind = serde_json::from_str(r#""question""#).unwrap();
        assert_eq!(kind, CommentKind::Question);
        let kind: CommentKind = serde_json::from_str(r#""review""#).unwrap();
        assert_eq!(kind, CommentKind::Review);
    }
}
