//! Question-follow relationship queries.
//!
//! # Invariants
//! - Duplicate `(user_id, question_id)` rows never duplicate results.
//! - `most_followed_questions` counts distinct followers per question id;
//!   ties keep ascending question id order.

use crate::model::question::{Question, QuestionId};
use crate::model::relation::{FollowId, QuestionFollow};
use crate::model::user::{User, UserId};
use crate::repo::question_repo::{query_questions, QUESTION_COLUMNS};
use crate::repo::user_repo::{query_users, USER_COLUMNS};
use crate::repo::{
    ensure_tables, Missing, RepoError, RepoResult, QUESTIONS, QUESTION_FOLLOWS, USERS,
};
use log::debug;
use rusqlite::{params, Connection};

/// Repository interface over the `question_follows` join table.
pub trait QuestionFollowRepository {
    /// Lists users following `question_id`.
    fn followers_for_question_id(&self, question_id: QuestionId) -> RepoResult<Vec<User>>;
    /// Lists questions followed by `user_id`.
    fn followed_questions_for_user_id(&self, user_id: UserId) -> RepoResult<Vec<Question>>;
    /// Returns up to `n` questions ranked by distinct follower count.
    fn most_followed_questions(&self, n: u32) -> RepoResult<Vec<Question>>;
    /// Inserts a new follow row or updates an existing one in place.
    fn save(&self, follow: &mut QuestionFollow) -> RepoResult<FollowId>;
}

/// SQLite-backed follow repository.
pub struct SqliteQuestionFollowRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionFollowRepository<'conn> {
    /// Wraps a connection whose schema the caller has already verified.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after checking every table this repository reads.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &[QUESTION_FOLLOWS, USERS, QUESTIONS])?;
        Ok(Self::new(conn))
    }
}

impl QuestionFollowRepository for SqliteQuestionFollowRepository<'_> {
    fn followers_for_question_id(&self, question_id: QuestionId) -> RepoResult<Vec<User>> {
        query_users(
            self.conn,
            &format!(
                "SELECT {USER_COLUMNS}
                 FROM users u
                 WHERE u.id IN (
                    SELECT user_id FROM question_follows WHERE question_id = ?1
                 )
                 ORDER BY u.id ASC;"
            ),
            [question_id],
        )
    }

    fn followed_questions_for_user_id(&self, user_id: UserId) -> RepoResult<Vec<Question>> {
        query_questions(
            self.conn,
            &format!(
                "SELECT {QUESTION_COLUMNS}
                 FROM questions q
                 WHERE q.id IN (
                    SELECT question_id FROM question_follows WHERE user_id = ?1
                 )
                 ORDER BY q.id ASC;"
            ),
            [user_id],
        )
    }

    fn most_followed_questions(&self, n: u32) -> RepoResult<Vec<Question>> {
        query_questions(
            self.conn,
            &format!(
                "SELECT {QUESTION_COLUMNS}
                 FROM questions q
                 INNER JOIN question_follows qf ON qf.question_id = q.id
                 GROUP BY q.id
                 ORDER BY COUNT(DISTINCT qf.user_id) DESC, q.id ASC
                 LIMIT ?1;"
            ),
            [i64::from(n)],
        )
    }

    fn save(&self, follow: &mut QuestionFollow) -> RepoResult<FollowId> {
        if let Some(id) = follow.id {
            let changed = self.conn.execute(
                "UPDATE question_follows SET user_id = ?1, question_id = ?2 WHERE id = ?3;",
                params![follow.user_id, follow.question_id, id],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(Missing::QuestionFollow(id)));
            }
            debug!(
                "event=follow_save module=repo status=ok mode=update id={id} question_id={}",
                follow.question_id
            );
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO question_follows (user_id, question_id) VALUES (?1, ?2);",
            params![follow.user_id, follow.question_id],
        )?;
        let id = self.conn.last_insert_rowid();
        follow.id = Some(id);
        debug!(
            "event=follow_save module=repo status=ok mode=insert id={id} question_id={}",
            follow.question_id
        );
        Ok(id)
    }
}
