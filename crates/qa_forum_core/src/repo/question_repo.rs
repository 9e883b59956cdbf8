//! Question repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Look up questions by id or author and persist question rows.
//! - Expose the question-centric view of replies, followers and likes.
//!
//! # Invariants
//! - Sequence results are ordered by question id ascending.
//! - Ranking queries group by question id and count distinct users.

use crate::model::question::{Question, QuestionId};
use crate::model::reply::Reply;
use crate::model::user::{User, UserId};
use crate::repo::follow_repo::{QuestionFollowRepository, SqliteQuestionFollowRepository};
use crate::repo::like_repo::{QuestionLikeRepository, SqliteQuestionLikeRepository};
use crate::repo::reply_repo::{ReplyRepository, SqliteReplyRepository};
use crate::repo::user_repo::user_full_name;
use crate::repo::{
    ensure_tables, Missing, RepoError, RepoResult, QUESTIONS, QUESTION_FOLLOWS, QUESTION_LIKES,
    REPLIES, USERS,
};
use log::debug;
use rusqlite::{named_params, params, Connection, OptionalExtension, Params, Row};

/// Column list for any query that hydrates `Question` from alias `q`.
pub(crate) const QUESTION_COLUMNS: &str =
    "q.id AS id, q.title AS title, q.body AS body, q.author_id AS author_id";

/// Repository interface for question lookups, derived views and writes.
pub trait QuestionRepository {
    /// Loads one question by primary key.
    fn find_by_id(&self, id: QuestionId) -> RepoResult<Question>;
    /// Lists every question written by `author_id`.
    fn find_by_author_id(&self, author_id: UserId) -> RepoResult<Vec<Question>>;
    /// Returns the author's name as `first last`.
    fn author(&self, question: &Question) -> RepoResult<String>;
    /// Lists all replies posted under the question, at any depth.
    fn replies(&self, question: &Question) -> RepoResult<Vec<Reply>>;
    /// Lists users following the question.
    fn followers(&self, question: &Question) -> RepoResult<Vec<User>>;
    /// Lists users who liked the question.
    fn likers(&self, question: &Question) -> RepoResult<Vec<User>>;
    /// Counts distinct likers of the question.
    fn num_likes(&self, question: &Question) -> RepoResult<u64>;
    /// Returns up to `n` questions with the most distinct followers.
    fn most_followed(&self, n: u32) -> RepoResult<Vec<Question>>;
    /// Returns up to `n` questions with the most distinct likers.
    fn most_liked(&self, n: u32) -> RepoResult<Vec<Question>>;
    /// Inserts a new question or updates an existing one in place.
    fn save(&self, question: &mut Question) -> RepoResult<QuestionId>;
}

/// SQLite-backed question repository.
pub struct SqliteQuestionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionRepository<'conn> {
    /// Wraps a connection whose schema the caller has already verified.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after checking every table this repository reads.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[QUESTIONS, USERS, REPLIES, QUESTION_FOLLOWS, QUESTION_LIKES],
        )?;
        Ok(Self::new(conn))
    }
}

impl QuestionRepository for SqliteQuestionRepository<'_> {
    fn find_by_id(&self, id: QuestionId) -> RepoResult<Question> {
        self.conn
            .query_row(
                &format!("SELECT {QUESTION_COLUMNS} FROM questions q WHERE q.id = ?1;"),
                [id],
                parse_question_row,
            )
            .optional()?
            .ok_or(RepoError::NotFound(Missing::Question(id)))
    }

    fn find_by_author_id(&self, author_id: UserId) -> RepoResult<Vec<Question>> {
        query_questions(
            self.conn,
            &format!(
                "SELECT {QUESTION_COLUMNS}
                 FROM questions q
                 WHERE q.author_id = ?1
                 ORDER BY q.id ASC;"
            ),
            [author_id],
        )
    }

    fn author(&self, question: &Question) -> RepoResult<String> {
        user_full_name(self.conn, question.author_id)
    }

    fn replies(&self, question: &Question) -> RepoResult<Vec<Reply>> {
        match question.id {
            Some(id) => SqliteReplyRepository::new(self.conn).find_by_question_id(id),
            None => Ok(Vec::new()),
        }
    }

    fn followers(&self, question: &Question) -> RepoResult<Vec<User>> {
        match question.id {
            Some(id) => SqliteQuestionFollowRepository::new(self.conn).followers_for_question_id(id),
            None => Ok(Vec::new()),
        }
    }

    fn likers(&self, question: &Question) -> RepoResult<Vec<User>> {
        match question.id {
            Some(id) => SqliteQuestionLikeRepository::new(self.conn).likers_for_question_id(id),
            None => Ok(Vec::new()),
        }
    }

    fn num_likes(&self, question: &Question) -> RepoResult<u64> {
        match question.id {
            Some(id) => SqliteQuestionLikeRepository::new(self.conn).num_likes_for_question_id(id),
            None => Ok(0),
        }
    }

    fn most_followed(&self, n: u32) -> RepoResult<Vec<Question>> {
        SqliteQuestionFollowRepository::new(self.conn).most_followed_questions(n)
    }

    fn most_liked(&self, n: u32) -> RepoResult<Vec<Question>> {
        SqliteQuestionLikeRepository::new(self.conn).most_liked_questions(n)
    }

    fn save(&self, question: &mut Question) -> RepoResult<QuestionId> {
        if let Some(id) = question.id {
            let changed = self.conn.execute(
                "UPDATE questions
                 SET
                    title = :title,
                    body = :body,
                    author_id = :author_id
                 WHERE id = :id;",
                named_params! {
                    ":id": id,
                    ":title": question.title.as_str(),
                    ":body": question.body.as_str(),
                    ":author_id": question.author_id,
                },
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(Missing::Question(id)));
            }
            debug!("event=question_save module=repo status=ok mode=update id={id}");
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO questions (title, body, author_id) VALUES (?1, ?2, ?3);",
            params![
                question.title.as_str(),
                question.body.as_str(),
                question.author_id
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        question.id = Some(id);
        debug!("event=question_save module=repo status=ok mode=insert id={id}");
        Ok(id)
    }
}

/// Runs `sql` and hydrates every row as a `Question`.
pub(crate) fn query_questions<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<Question>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut questions = Vec::new();

    while let Some(row) = rows.next()? {
        questions.push(parse_question_row(row)?);
    }

    Ok(questions)
}

pub(crate) fn parse_question_row(row: &Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        body: row.get("body")?,
        author_id: row.get("author_id")?,
    })
}
