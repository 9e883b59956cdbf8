//! Repository layer over the forum store.
//!
//! # Responsibility
//! - Define one data-access contract per entity and its SQLite implementation.
//! - Map rows to typed entities by column name at this boundary only.
//!
//! # Invariants
//! - Every statement is parameterized; values are never spliced into SQL.
//! - Single-row lookups that match nothing fail with `RepoError::NotFound`.
//! - Repositories borrow the caller's connection and keep no other state.

use crate::db::DbError;
use crate::model::question::QuestionId;
use crate::model::relation::{FollowId, LikeId};
use crate::model::reply::ReplyId;
use crate::model::user::UserId;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod follow_repo;
pub mod like_repo;
pub mod question_repo;
pub mod reply_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Row that a lookup expected but the store did not return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    User(UserId),
    UserNamed { fname: String, lname: String },
    Question(QuestionId),
    Reply(ReplyId),
    QuestionFollow(FollowId),
    QuestionLike(LikeId),
}

impl Display for Missing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::UserNamed { fname, lname } => write!(f, "user named `{fname} {lname}`"),
            Self::Question(id) => write!(f, "question {id}"),
            Self::Reply(id) => write!(f, "reply {id}"),
            Self::QuestionFollow(id) => write!(f, "question follow {id}"),
            Self::QuestionLike(id) => write!(f, "question like {id}"),
        }
    }
}

/// Error returned by every repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// The store could not run the statement.
    Db(DbError),
    /// A single-row lookup or in-place update matched no row.
    NotFound(Missing),
    /// Connection lacks a table this repository queries.
    MissingRequiredTable(&'static str),
    /// Table exists but lacks a column this repository queries.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Stored value cannot be represented by the entity type.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether the error only reports an absent row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(missing) => write!(f, "{missing} not found"),
            Self::MissingRequiredTable(table) => {
                write!(f, "forum repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "forum repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid forum data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Table name plus the columns repositories read or write.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableShape {
    name: &'static str,
    columns: &'static [&'static str],
}

pub(crate) const USERS: TableShape = TableShape {
    name: "users",
    columns: &["id", "fname", "lname"],
};

pub(crate) const QUESTIONS: TableShape = TableShape {
    name: "questions",
    columns: &["id", "title", "body", "author_id"],
};

pub(crate) const REPLIES: TableShape = TableShape {
    name: "replies",
    columns: &["id", "question_id", "parent_id", "replier_id", "body"],
};

pub(crate) const QUESTION_FOLLOWS: TableShape = TableShape {
    name: "question_follows",
    columns: &["id", "user_id", "question_id"],
};

pub(crate) const QUESTION_LIKES: TableShape = TableShape {
    name: "question_likes",
    columns: &["id", "question_id", "user_id"],
};

/// Verifies that `conn` exposes every listed table with its columns.
pub(crate) fn ensure_tables(conn: &Connection, tables: &[TableShape]) -> RepoResult<()> {
    for table in tables {
        if !table_exists(conn, table.name)? {
            return Err(RepoError::MissingRequiredTable(table.name));
        }
        for &column in table.columns {
            if !table_has_column(conn, table.name, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: table.name,
                    column,
                });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM pragma_table_info(?1)
            WHERE name = ?2
        );",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Converts a store count into an unsigned value.
pub(crate) fn count_from_db(value: i64, what: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative {what} count `{value}`")))
}
