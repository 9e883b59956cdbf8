//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Look up users by id or name and persist user rows.
//! - Expose the user-centric view of questions, replies, follows and likes.
//!
//! # Invariants
//! - `find_by_name` returns the lowest-id match when names collide.
//! - `average_karma` never yields NaN or infinity.

use crate::model::question::Question;
use crate::model::reply::Reply;
use crate::model::user::{format_full_name, User, UserId};
use crate::repo::follow_repo::{QuestionFollowRepository, SqliteQuestionFollowRepository};
use crate::repo::like_repo::{QuestionLikeRepository, SqliteQuestionLikeRepository};
use crate::repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
use crate::repo::reply_repo::{ReplyRepository, SqliteReplyRepository};
use crate::repo::{
    count_from_db, ensure_tables, Missing, RepoError, RepoResult, QUESTIONS, QUESTION_FOLLOWS,
    QUESTION_LIKES, REPLIES, USERS,
};
use log::debug;
use rusqlite::{named_params, params, Connection, OptionalExtension, Params, Row};

/// Column list for any query that hydrates `User` from alias `u`.
pub(crate) const USER_COLUMNS: &str = "u.id AS id, u.fname AS fname, u.lname AS lname";

/// Repository interface for user lookups, derived views and writes.
pub trait UserRepository {
    /// Loads one user by primary key.
    fn find_by_id(&self, id: UserId) -> RepoResult<User>;
    /// Loads the first user with exactly this first and last name.
    fn find_by_name(&self, fname: &str, lname: &str) -> RepoResult<User>;
    /// Lists questions the user wrote.
    fn authored_questions(&self, user: &User) -> RepoResult<Vec<Question>>;
    /// Lists replies the user posted.
    fn authored_replies(&self, user: &User) -> RepoResult<Vec<Reply>>;
    /// Lists questions the user follows.
    fn followed_questions(&self, user: &User) -> RepoResult<Vec<Question>>;
    /// Lists questions the user liked.
    fn liked_questions(&self, user: &User) -> RepoResult<Vec<Question>>;
    /// Likes received per authored question. `0.0` when nothing is authored.
    fn average_karma(&self, user: &User) -> RepoResult<f64>;
    /// Inserts a new user or updates an existing one in place.
    fn save(&self, user: &mut User) -> RepoResult<UserId>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Wraps a connection whose schema the caller has already verified.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after checking every table this repository reads.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[USERS, QUESTIONS, REPLIES, QUESTION_FOLLOWS, QUESTION_LIKES],
        )?;
        Ok(Self::new(conn))
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn find_by_id(&self, id: UserId) -> RepoResult<User> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1;"),
                [id],
                parse_user_row,
            )
            .optional()?
            .ok_or(RepoError::NotFound(Missing::User(id)))
    }

    fn find_by_name(&self, fname: &str, lname: &str) -> RepoResult<User> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {USER_COLUMNS}
                     FROM users u
                     WHERE u.fname = ?1 AND u.lname = ?2
                     ORDER BY u.id ASC
                     LIMIT 1;"
                ),
                [fname, lname],
                parse_user_row,
            )
            .optional()?
            .ok_or_else(|| {
                RepoError::NotFound(Missing::UserNamed {
                    fname: fname.to_string(),
                    lname: lname.to_string(),
                })
            })
    }

    fn authored_questions(&self, user: &User) -> RepoResult<Vec<Question>> {
        match user.id {
            Some(id) => SqliteQuestionRepository::new(self.conn).find_by_author_id(id),
            None => Ok(Vec::new()),
        }
    }

    fn authored_replies(&self, user: &User) -> RepoResult<Vec<Reply>> {
        match user.id {
            Some(id) => SqliteReplyRepository::new(self.conn).find_by_user_id(id),
            None => Ok(Vec::new()),
        }
    }

    fn followed_questions(&self, user: &User) -> RepoResult<Vec<Question>> {
        match user.id {
            Some(id) => {
                SqliteQuestionFollowRepository::new(self.conn).followed_questions_for_user_id(id)
            }
            None => Ok(Vec::new()),
        }
    }

    fn liked_questions(&self, user: &User) -> RepoResult<Vec<Question>> {
        match user.id {
            Some(id) => SqliteQuestionLikeRepository::new(self.conn).liked_questions_for_user_id(id),
            None => Ok(Vec::new()),
        }
    }

    fn average_karma(&self, user: &User) -> RepoResult<f64> {
        let Some(id) = user.id else {
            return Ok(0.0);
        };

        let (likes, questions): (i64, i64) = self.conn.query_row(
            "SELECT
                COUNT(DISTINCT ql.id) AS like_count,
                COUNT(DISTINCT q.id) AS question_count
             FROM questions q
             LEFT OUTER JOIN question_likes ql ON ql.question_id = q.id
             INNER JOIN users u ON u.id = q.author_id
             WHERE u.id = ?1;",
            [id],
            |row| Ok((row.get("like_count")?, row.get("question_count")?)),
        )?;

        Ok(karma_ratio(
            count_from_db(likes, "like")?,
            count_from_db(questions, "question")?,
        ))
    }

    fn save(&self, user: &mut User) -> RepoResult<UserId> {
        if let Some(id) = user.id {
            let changed = self.conn.execute(
                "UPDATE users
                 SET
                    fname = :fname,
                    lname = :lname
                 WHERE id = :id;",
                named_params! {
                    ":id": id,
                    ":fname": user.fname.as_str(),
                    ":lname": user.lname.as_str(),
                },
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(Missing::User(id)));
            }
            debug!("event=user_save module=repo status=ok mode=update id={id}");
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO users (fname, lname) VALUES (?1, ?2);",
            params![user.fname.as_str(), user.lname.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        user.id = Some(id);
        debug!("event=user_save module=repo status=ok mode=insert id={id}");
        Ok(id)
    }
}

/// Loads a user's name as `first last`.
pub(crate) fn user_full_name(conn: &Connection, id: UserId) -> RepoResult<String> {
    conn.query_row(
        "SELECT fname, lname FROM users WHERE id = ?1;",
        [id],
        |row| {
            let fname: String = row.get("fname")?;
            let lname: String = row.get("lname")?;
            Ok(format_full_name(&fname, &lname))
        },
    )
    .optional()?
    .ok_or(RepoError::NotFound(Missing::User(id)))
}

/// Runs `sql` and hydrates every row as a `User`.
pub(crate) fn query_users<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut users = Vec::new();

    while let Some(row) = rows.next()? {
        users.push(parse_user_row(row)?);
    }

    Ok(users)
}

pub(crate) fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: Some(row.get("id")?),
        fname: row.get("fname")?,
        lname: row.get("lname")?,
    })
}

fn karma_ratio(likes: u64, questions: u64) -> f64 {
    if questions == 0 {
        return 0.0;
    }
    likes as f64 / questions as f64
}

#[cfg(test)]
mod tests {
    use super::karma_ratio;

    #[test]
    fn karma_ratio_is_zero_without_questions() {
        assert_eq!(karma_ratio(0, 0), 0.0);
        assert_eq!(karma_ratio(4, 0), 0.0);
    }

    #[test]
    fn karma_ratio_divides_as_float() {
        assert_eq!(karma_ratio(3, 2), 1.5);
        assert_eq!(karma_ratio(0, 3), 0.0);
    }
}
