//! Question entity and its lightweight projection.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Store-assigned question identifier.
pub type QuestionId = i64;

/// A question asked by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// `None` until the first save.
    pub id: Option<QuestionId>,
    pub title: String,
    pub body: String,
    /// Not checked on write; a dangling author surfaces on `author` lookup.
    pub author_id: UserId,
}

impl Question {
    /// Creates an unsaved question.
    pub fn new(title: impl Into<String>, body: impl Into<String>, author_id: UserId) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
            author_id,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Title and body of a question, as seen from one of its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub title: String,
    pub body: String,
}
