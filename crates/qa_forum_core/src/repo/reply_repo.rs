//! Reply repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Look up replies by id, author or question and persist reply rows.
//! - Provide one level of thread navigation per call (parent or children).
//!
//! # Invariants
//! - Sequence results are ordered by reply id ascending.
//! - A top-level reply has no parent; that is a normal `None`, not an error.
//! - A `parent_id` that points at no row surfaces as `NotFound`.

use crate::model::question::{QuestionId, QuestionSummary};
use crate::model::reply::{Reply, ReplyId};
use crate::model::user::UserId;
use crate::repo::user_repo::user_full_name;
use crate::repo::{ensure_tables, Missing, RepoError, RepoResult, QUESTIONS, REPLIES, USERS};
use log::debug;
use rusqlite::{named_params, params, Connection, OptionalExtension, Params, Row};

const REPLY_COLUMNS: &str = "r.id AS id,
    r.question_id AS question_id,
    r.parent_id AS parent_id,
    r.replier_id AS replier_id,
    r.body AS body";

/// Repository interface for reply lookups, thread navigation and writes.
pub trait ReplyRepository {
    /// Loads one reply by primary key.
    fn find_by_id(&self, id: ReplyId) -> RepoResult<Reply>;
    /// Lists replies posted by `user_id`.
    fn find_by_user_id(&self, user_id: UserId) -> RepoResult<Vec<Reply>>;
    /// Lists replies under `question_id`, at any depth.
    fn find_by_question_id(&self, question_id: QuestionId) -> RepoResult<Vec<Reply>>;
    /// Returns the replier's name as `first last`.
    fn author(&self, reply: &Reply) -> RepoResult<String>;
    /// Returns title and body of the question the reply belongs to.
    fn question(&self, reply: &Reply) -> RepoResult<QuestionSummary>;
    /// Returns the body of the direct parent, or `None` for a top-level reply.
    fn parent_reply(&self, reply: &Reply) -> RepoResult<Option<String>>;
    /// Returns the bodies of all direct children.
    fn child_replies(&self, reply: &Reply) -> RepoResult<Vec<String>>;
    /// Inserts a new reply or updates an existing one in place.
    fn save(&self, reply: &mut Reply) -> RepoResult<ReplyId>;
}

/// SQLite-backed reply repository.
pub struct SqliteReplyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReplyRepository<'conn> {
    /// Wraps a connection whose schema the caller has already verified.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after checking every table this repository reads.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &[REPLIES, USERS, QUESTIONS])?;
        Ok(Self::new(conn))
    }
}

impl ReplyRepository for SqliteReplyRepository<'_> {
    fn find_by_id(&self, id: ReplyId) -> RepoResult<Reply> {
        self.conn
            .query_row(
                &format!("SELECT {REPLY_COLUMNS} FROM replies r WHERE r.id = ?1;"),
                [id],
                parse_reply_row,
            )
            .optional()?
            .ok_or(RepoError::NotFound(Missing::Reply(id)))
    }

    fn find_by_user_id(&self, user_id: UserId) -> RepoResult<Vec<Reply>> {
        query_replies(
            self.conn,
            &format!(
                "SELECT {REPLY_COLUMNS}
                 FROM replies r
                 WHERE r.replier_id = ?1
                 ORDER BY r.id ASC;"
            ),
            [user_id],
        )
    }

    fn find_by_question_id(&self, question_id: QuestionId) -> RepoResult<Vec<Reply>> {
        query_replies(
            self.conn,
            &format!(
                "SELECT {REPLY_COLUMNS}
                 FROM replies r
                 WHERE r.question_id = ?1
                 ORDER BY r.id ASC;"
            ),
            [question_id],
        )
    }

    fn author(&self, reply: &Reply) -> RepoResult<String> {
        user_full_name(self.conn, reply.replier_id)
    }

    fn question(&self, reply: &Reply) -> RepoResult<QuestionSummary> {
        self.conn
            .query_row(
                "SELECT title, body FROM questions WHERE id = ?1;",
                [reply.question_id],
                |row| {
                    Ok(QuestionSummary {
                        title: row.get("title")?,
                        body: row.get("body")?,
                    })
                },
            )
            .optional()?
            .ok_or(RepoError::NotFound(Missing::Question(reply.question_id)))
    }

    fn parent_reply(&self, reply: &Reply) -> RepoResult<Option<String>> {
        let Some(parent_id) = reply.parent_id else {
            return Ok(None);
        };

        let body = self
            .conn
            .query_row(
                "SELECT body FROM replies WHERE id = ?1;",
                [parent_id],
                |row| row.get::<_, String>("body"),
            )
            .optional()?
            .ok_or(RepoError::NotFound(Missing::Reply(parent_id)))?;
        Ok(Some(body))
    }

    fn child_replies(&self, reply: &Reply) -> RepoResult<Vec<String>> {
        let Some(id) = reply.id else {
            return Ok(Vec::new());
        };

        let mut stmt = self
            .conn
            .prepare("SELECT body FROM replies WHERE parent_id = ?1 ORDER BY id ASC;")?;
        let mut rows = stmt.query([id])?;
        let mut bodies = Vec::new();

        while let Some(row) = rows.next()? {
            bodies.push(row.get("body")?);
        }

        Ok(bodies)
    }

    fn save(&self, reply: &mut Reply) -> RepoResult<ReplyId> {
        if let Some(id) = reply.id {
            let changed = self.conn.execute(
                "UPDATE replies
                 SET
                    question_id = :question_id,
                    parent_id = :parent_id,
                    replier_id = :replier_id,
                    body = :body
                 WHERE id = :id;",
                named_params! {
                    ":id": id,
                    ":question_id": reply.question_id,
                    ":parent_id": reply.parent_id,
                    ":replier_id": reply.replier_id,
                    ":body": reply.body.as_str(),
                },
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(Missing::Reply(id)));
            }
            debug!("event=reply_save module=repo status=ok mode=update id={id}");
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO replies (question_id, parent_id, replier_id, body)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                reply.question_id,
                reply.parent_id,
                reply.replier_id,
                reply.body.as_str()
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        reply.id = Some(id);
        debug!("event=reply_save module=repo status=ok mode=insert id={id}");
        Ok(id)
    }
}

fn query_replies<P: Params>(conn: &Connection, sql: &str, params: P) -> RepoResult<Vec<Reply>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut replies = Vec::new();

    while let Some(row) = rows.next()? {
        replies.push(parse_reply_row(row)?);
    }

    Ok(replies)
}

fn parse_reply_row(row: &Row<'_>) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: Some(row.get("id")?),
        question_id: row.get("question_id")?,
        parent_id: row.get("parent_id")?,
        replier_id: row.get("replier_id")?,
        body: row.get("body")?,
    })
}
