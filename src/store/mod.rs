//! Postgres-backed document store.
//!
//! Each collection is a table of `(id, doc JSONB)` rows; every operation is a
//! single-row read-modify-write, matching the document-store contract the
//! rest of the crate assumes (`find_one` / `find_by_id` / `save` /
//! `delete_by_id`, single-document atomicity, no multi-document
//! transactions). Concurrent writers to the same document race last-write-
//! wins, which the OTP flows accept by design.

use serde::{Deserialize, Serialize};
use tracing::Span;
use uuid::Uuid;

pub mod posts;
pub mod recipes;
pub mod users;

/// Denormalized author stamp embedded in recipes, posts, and their comments.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Author {
    pub user_id: Uuid,
    pub username: String,
}

/// Flip membership of `id` in an id list, returning true when the id is
/// present after the flip. Follow, favourite, hide, and like all share this.
pub fn toggle_membership(list: &mut Vec<Uuid>, id: Uuid) -> bool {
    if let Some(position) = list.iter().position(|member| *member == id) {
        list.remove(position);
        false
    } else {
        list.push(id);
        true
    }
}

pub(crate) fn query_span(operation: &str, statement: &str) -> Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
