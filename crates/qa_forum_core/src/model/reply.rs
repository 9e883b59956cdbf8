//! Reply entity.
//!
//! Replies form a forest per question through `parent_id`. Nothing in the
//! model prevents cycles, so traversal code must not assume they are absent.

use crate::model::question::QuestionId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Store-assigned reply identifier.
pub type ReplyId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// `None` until the first save.
    pub id: Option<ReplyId>,
    pub question_id: QuestionId,
    /// `None` marks a top-level reply.
    pub parent_id: Option<ReplyId>,
    pub replier_id: UserId,
    pub body: String,
}

impl Reply {
    /// Creates an unsaved top-level reply.
    pub fn new(question_id: QuestionId, replier_id: UserId, body: impl Into<String>) -> Self {
        Self {
            id: None,
            question_id,
            parent_id: None,
            replier_id,
            body: body.into(),
        }
    }

    /// Creates an unsaved reply nested under `parent_id`.
    pub fn new_child(
        question_id: QuestionId,
        parent_id: ReplyId,
        replier_id: UserId,
        body: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(question_id, replier_id, body)
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}
