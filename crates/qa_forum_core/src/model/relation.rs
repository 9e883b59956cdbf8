//! Join rows linking users to the questions they follow or like.
//!
//! The store does not enforce `(user_id, question_id)` uniqueness, so the
//! same pair may appear more than once. Counting code deduplicates.

use crate::model::question::QuestionId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type FollowId = i64;
pub type LikeId = i64;

/// One `question_follows` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFollow {
    pub id: Option<FollowId>,
    pub user_id: UserId,
    pub question_id: QuestionId,
}

impl QuestionFollow {
    pub fn new(user_id: UserId, question_id: QuestionId) -> Self {
        Self {
            id: None,
            user_id,
            question_id,
        }
    }
}

/// One `question_likes` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionLike {
    pub id: Option<LikeId>,
    pub question_id: QuestionId,
    pub user_id: UserId,
}

impl QuestionLike {
    pub fn new(user_id: UserId, question_id: QuestionId) -> Self {
        Self {
            id: None,
            question_id,
            user_id,
        }
    }
}
