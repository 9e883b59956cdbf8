//! Persistence and query layer for a question-and-answer forum.
//!
//! Repositories borrow one caller-owned SQLite connection (see [`db`]) and
//! map rows to typed entities. There is no global connection and no cache:
//! every derived collection re-queries the store.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, OpenOptions};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::question::{Question, QuestionId, QuestionSummary};
pub use model::relation::{FollowId, LikeId, QuestionFollow, QuestionLike};
pub use model::reply::{Reply, ReplyId};
pub use model::user::{User, UserId};
pub use repo::follow_repo::{QuestionFollowRepository, SqliteQuestionFollowRepository};
pub use repo::like_repo::{QuestionLikeRepository, SqliteQuestionLikeRepository};
pub use repo::question_repo::{QuestionRepository, SqliteQuestionRepository};
pub use repo::reply_repo::{ReplyRepository, SqliteReplyRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{Missing, RepoError, RepoResult};
pub use service::thread_service::{depth_first, ReplyNode, ReplyThread, ThreadService};
