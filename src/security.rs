//! Security-question recovery challenge.
//!
//! Answers are hashed with the same one-way primitive as passwords at
//! set-time. A challenge only passes when every stored question has a
//! matching submitted answer; matching is by question text, so submission
//! order does not matter.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::password;

/// A stored question with its hashed answer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityQuestion {
    pub question: String,
    pub answer_hash: String,
}

/// A plaintext question/answer pair as submitted by the client.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmittedAnswer {
    pub question: String,
    pub answer: String,
}

/// Hash a batch of selected questions for storage.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn set_questions(selected: &[SubmittedAnswer]) -> Result<Vec<SecurityQuestion>> {
    selected
        .iter()
        .map(|pair| {
            Ok(SecurityQuestion {
                question: pair.question.clone(),
                answer_hash: password::hash(&pair.answer)?,
            })
        })
        .collect()
}

/// Check a full challenge: every stored question must be answered correctly.
///
/// A missing answer for any stored question fails the challenge, as does a
/// single hash mismatch.
#[must_use]
pub fn check_answers(stored: &[SecurityQuestion], submitted: &[SubmittedAnswer]) -> bool {
    if stored.is_empty() {
        return false;
    }

    stored.iter().all(|question| {
        submitted
            .iter()
            .find(|pair| pair.question == question.question)
            .is_some_and(|pair| password::verify(&pair.answer, &question.answer_hash))
    })
}
