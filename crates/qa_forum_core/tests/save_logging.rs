use log::{Level, LevelFilter, Log, Metadata, Record};
use qa_forum_core::db::open_db_in_memory;
use qa_forum_core::{
    Question, QuestionFollow, QuestionFollowRepository, QuestionLike, QuestionLikeRepository,
    QuestionRepository, Reply, ReplyRepository, SqliteQuestionFollowRepository,
    SqliteQuestionLikeRepository, SqliteQuestionRepository, SqliteReplyRepository,
    SqliteUserRepository, ThreadService, User, UserRepository,
};
use std::sync::Mutex;

struct CapturingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.lines
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    lines: Mutex::new(Vec::new()),
};

fn captured(level: Level, needle: &str) -> bool {
    LOGGER
        .lines
        .lock()
        .unwrap()
        .iter()
        .any(|(line_level, line)| *line_level == level && line.contains(needle))
}

// One test per file: the global logger is process-wide.
#[test]
fn saves_and_partial_threads_emit_events() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let conn = open_db_in_memory().unwrap();
    let user_repo = SqliteUserRepository::try_new(&conn).unwrap();
    let mut author = User::new("Ada", "Lovelace");
    let mut reader = User::new("Bob", "Banks");
    user_repo.save(&mut author).unwrap();
    user_repo.save(&mut reader).unwrap();

    let mut question = Question::new("Q", "B", author.id.unwrap());
    SqliteQuestionRepository::try_new(&conn)
        .unwrap()
        .save(&mut question)
        .unwrap();
    let question_id = question.id.unwrap();

    let follow_repo = SqliteQuestionFollowRepository::try_new(&conn).unwrap();
    let mut follow = QuestionFollow::new(reader.id.unwrap(), question_id);
    let follow_id = follow_repo.save(&mut follow).unwrap();
    follow.user_id = author.id.unwrap();
    follow_repo.save(&mut follow).unwrap();

    let like_repo = SqliteQuestionLikeRepository::try_new(&conn).unwrap();
    let mut like = QuestionLike::new(reader.id.unwrap(), question_id);
    let like_id = like_repo.save(&mut like).unwrap();
    like.user_id = author.id.unwrap();
    like_repo.save(&mut like).unwrap();

    assert!(captured(
        Level::Debug,
        &format!("event=follow_save module=repo status=ok mode=update id={follow_id}")
    ));
    assert!(captured(
        Level::Debug,
        &format!("event=like_save module=repo status=ok mode=update id={like_id}")
    ));

    let reply_repo = SqliteReplyRepository::try_new(&conn).unwrap();
    let mut x = Reply::new(question_id, reader.id.unwrap(), "x");
    reply_repo.save(&mut x).unwrap();
    let mut y = Reply::new_child(question_id, x.id.unwrap(), author.id.unwrap(), "y");
    reply_repo.save(&mut y).unwrap();
    x.parent_id = y.id;
    reply_repo.save(&mut x).unwrap();

    let thread = ThreadService::new(reply_repo)
        .thread_for_question(&question)
        .unwrap();
    assert!(thread.is_empty());
    assert_eq!(thread.dropped, 2);
    assert!(captured(
        Level::Warn,
        &format!("event=thread_build module=service status=partial question_id={question_id} dropped_replies=2")
    ));
}
