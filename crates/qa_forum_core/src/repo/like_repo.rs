//! Question-like relationship queries.
//!
//! # Invariants
//! - Duplicate `(user_id, question_id)` rows never duplicate results or counts.
//! - `most_liked_questions` counts distinct likers per question id;
//!   ties keep ascending question id order.

use crate::model::question::{Question, QuestionId};
use crate::model::relation::{LikeId, QuestionLike};
use crate::model::user::{User, UserId};
use crate::repo::question_repo::{query_questions, QUESTION_COLUMNS};
use crate::repo::user_repo::{query_users, USER_COLUMNS};
use crate::repo::{
    count_from_db, ensure_tables, Missing, RepoError, RepoResult, QUESTIONS, QUESTION_LIKES,
    USERS,
};
use log::debug;
use rusqlite::{params, Connection};

/// Repository interface over the `question_likes` join table.
pub trait QuestionLikeRepository {
    /// Lists users who liked `question_id`.
    fn likers_for_question_id(&self, question_id: QuestionId) -> RepoResult<Vec<User>>;
    /// Counts distinct likers of `question_id`; `0` when there are none.
    fn num_likes_for_question_id(&self, question_id: QuestionId) -> RepoResult<u64>;
    /// Lists questions liked by `user_id`.
    fn liked_questions_for_user_id(&self, user_id: UserId) -> RepoResult<Vec<Question>>;
    /// Returns up to `n` questions ranked by distinct liker count.
    fn most_liked_questions(&self, n: u32) -> RepoResult<Vec<Question>>;
    /// Inserts a new like row or updates an existing one in place.
    fn save(&self, like: &mut QuestionLike) -> RepoResult<LikeId>;
}

/// SQLite-backed like repository.
pub struct SqliteQuestionLikeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionLikeRepository<'conn> {
    /// Wraps a connection whose schema the caller has already verified.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after checking every table this repository reads.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &[QUESTION_LIKES, USERS, QUESTIONS])?;
        Ok(Self::new(conn))
    }
}

impl QuestionLikeRepository for SqliteQuestionLikeRepository<'_> {
    fn likers_for_question_id(&self, question_id: QuestionId) -> RepoResult<Vec<User>> {
        query_users(
            self.conn,
            &format!(
                "SELECT {USER_COLUMNS}
                 FROM users u
                 WHERE u.id IN (
                    SELECT user_id FROM question_likes WHERE question_id = ?1
                 )
                 ORDER BY u.id ASC;"
            ),
            [question_id],
        )
    }

    fn num_likes_for_question_id(&self, question_id: QuestionId) -> RepoResult<u64> {
        // No GROUP BY: the aggregate always yields one row, even for zero likes.
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT user_id) FROM question_likes WHERE question_id = ?1;",
            [question_id],
            |row| row.get(0),
        )?;
        count_from_db(count, "like")
    }

    fn liked_questions_for_user_id(&self, user_id: UserId) -> RepoResult<Vec<Question>> {
        query_questions(
            self.conn,
            &format!(
                "SELECT {QUESTION_COLUMNS}
                 FROM questions q
                 WHERE q.id IN (
                    SELECT question_id FROM question_likes WHERE user_id = ?1
                 )
                 ORDER BY q.id ASC;"
            ),
            [user_id],
        )
    }

    fn most_liked_questions(&self, n: u32) -> RepoResult<Vec<Question>> {
        query_questions(
            self.conn,
            &format!(
                "SELECT {QUESTION_COLUMNS}
                 FROM questions q
                 INNER JOIN question_likes ql ON ql.question_id = q.id
                 GROUP BY q.id
                 ORDER BY COUNT(DISTINCT ql.user_id) DESC, q.id ASC
                 LIMIT ?1;"
            ),
            [i64::from(n)],
        )
    }

    fn save(&self, like: &mut QuestionLike) -> RepoResult<LikeId> {
        if let Some(id) = like.id {
            let changed = self.conn.execute(
                "UPDATE question_likes SET question_id = ?1, user_id = ?2 WHERE id = ?3;",
                params![like.question_id, like.user_id, id],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(Missing::QuestionLike(id)));
            }
            debug!(
                "event=like_save module=repo status=ok mode=update id={id} question_id={}",
                like.question_id
            );
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO question_likes (question_id, user_id) VALUES (?1, ?2);",
            params![like.question_id, like.user_id],
        )?;
        let id = self.conn.last_insert_rowid();
        like.id = Some(id);
        debug!(
            "event=like_save module=repo status=ok mode=insert id={id} question_id={}",
            like.question_id
        );
        Ok(id)
    }
}
