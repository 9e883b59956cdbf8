use qa_forum_core::db::open_db_in_memory;
use qa_forum_core::{
    depth_first, Missing, Question, QuestionRepository, QuestionSummary, RepoError, Reply,
    ReplyRepository, SqliteQuestionRepository, SqliteReplyRepository, SqliteUserRepository,
    ThreadService, User, UserRepository,
};
use rusqlite::Connection;

struct Forum {
    conn: Connection,
    asker: User,
    helper: User,
    question: Question,
}

fn setup() -> Forum {
    let conn = open_db_in_memory().unwrap();
    let (asker, helper, question) = {
        let user_repo = SqliteUserRepository::try_new(&conn).unwrap();
        let mut asker = User::new("Ada", "Lovelace");
        let mut helper = User::new("Charles", "Babbage");
        user_repo.save(&mut asker).unwrap();
        user_repo.save(&mut helper).unwrap();

        let mut question = Question::new("Engines?", "How do they work?", asker.id.unwrap());
        SqliteQuestionRepository::try_new(&conn)
            .unwrap()
            .save(&mut question)
            .unwrap();
        (asker, helper, question)
    };

    Forum {
        conn,
        asker,
        helper,
        question,
    }
}

fn post(repo: &SqliteReplyRepository<'_>, mut reply: Reply) -> Reply {
    repo.save(&mut reply).unwrap();
    reply
}

#[test]
fn save_assigns_id_and_update_keeps_it() {
    let forum = setup();
    let repo = SqliteReplyRepository::try_new(&forum.conn).unwrap();

    let mut reply = Reply::new(forum.question.id.unwrap(), forum.helper.id.unwrap(), "gears");
    let id = repo.save(&mut reply).unwrap();
    assert_eq!(reply.id, Some(id));

    reply.body = "many gears".to_string();
    assert_eq!(repo.save(&mut reply).unwrap(), id);
    assert_eq!(repo.find_by_id(id).unwrap().body, "many gears");

    let err = repo.find_by_id(id + 1).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(Missing::Reply(_))));
}

#[test]
fn find_by_user_and_question() {
    let forum = setup();
    let repo = SqliteReplyRepository::try_new(&forum.conn).unwrap();
    let question_id = forum.question.id.unwrap();

    let first = post(&repo, Reply::new(question_id, forum.helper.id.unwrap(), "one"));
    let second = post(&repo, Reply::new(question_id, forum.asker.id.unwrap(), "two"));

    assert_eq!(
        repo.find_by_question_id(question_id).unwrap(),
        vec![first.clone(), second.clone()]
    );
    assert_eq!(
        repo.find_by_user_id(forum.helper.id.unwrap()).unwrap(),
        vec![first]
    );
    assert_eq!(
        repo.find_by_user_id(forum.asker.id.unwrap()).unwrap(),
        vec![second]
    );
}

#[test]
fn author_and_question_projection() {
    let forum = setup();
    let repo = SqliteReplyRepository::try_new(&forum.conn).unwrap();
    let reply = post(
        &repo,
        Reply::new(forum.question.id.unwrap(), forum.helper.id.unwrap(), "gears"),
    );

    assert_eq!(repo.author(&reply).unwrap(), "Charles Babbage");
    assert_eq!(
        repo.question(&reply).unwrap(),
        QuestionSummary {
            title: "Engines?".to_string(),
            body: "How do they work?".to_string(),
        }
    );

    let stray = Reply::new(999, 998, "nowhere");
    assert!(matches!(
        repo.author(&stray).unwrap_err(),
        RepoError::NotFound(Missing::User(998))
    ));
    assert!(matches!(
        repo.question(&stray).unwrap_err(),
        RepoError::NotFound(Missing::Question(999))
    ));
}

#[test]
fn parent_reply_is_none_for_top_level_and_body_for_nested() {
    let forum = setup();
    let repo = SqliteReplyRepository::try_new(&forum.conn).unwrap();
    let question_id = forum.question.id.unwrap();

    let top = post(&repo, Reply::new(question_id, forum.helper.id.unwrap(), "top"));
    let nested = post(
        &repo,
        Reply::new_child(question_id, top.id.unwrap(), forum.asker.id.unwrap(), "nested"),
    );

    assert_eq!(repo.parent_reply(&top).unwrap(), None);
    assert_eq!(repo.parent_reply(&nested).unwrap().as_deref(), Some("top"));

    let dangling = Reply::new_child(question_id, 500, forum.asker.id.unwrap(), "lost");
    let err = repo.parent_reply(&dangling).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(Missing::Reply(500))));
}

#[test]
fn child_replies_returns_all_direct_children() {
    let forum = setup();
    let repo = SqliteReplyRepository::try_new(&forum.conn).unwrap();
    let question_id = forum.question.id.unwrap();
    let helper_id = forum.helper.id.unwrap();

    let top = post(&repo, Reply::new(question_id, helper_id, "top"));
    let left = post(&repo, Reply::new_child(question_id, top.id.unwrap(), helper_id, "left"));
    post(&repo, Reply::new_child(question_id, top.id.unwrap(), helper_id, "right"));
    post(&repo, Reply::new_child(question_id, left.id.unwrap(), helper_id, "grandchild"));

    assert_eq!(repo.child_replies(&top).unwrap(), vec!["left", "right"]);
    assert_eq!(repo.child_replies(&left).unwrap(), vec!["grandchild"]);
    assert!(repo
        .child_replies(&Reply::new(question_id, helper_id, "unsaved"))
        .unwrap()
        .is_empty());
}

#[test]
fn thread_service_rebuilds_full_forest() {
    let forum = setup();
    let repo = SqliteReplyRepository::try_new(&forum.conn).unwrap();
    let question_id = forum.question.id.unwrap();
    let helper_id = forum.helper.id.unwrap();

    let a = post(&repo, Reply::new(question_id, helper_id, "a"));
    let b = post(&repo, Reply::new(question_id, helper_id, "b"));
    let a1 = post(&repo, Reply::new_child(question_id, a.id.unwrap(), helper_id, "a1"));
    post(&repo, Reply::new_child(question_id, a1.id.unwrap(), helper_id, "a1x"));
    post(&repo, Reply::new_child(question_id, b.id.unwrap(), helper_id, "b1"));

    let service = ThreadService::new(repo);
    let thread = service.thread_for_question(&forum.question).unwrap();

    assert_eq!(thread.roots.len(), 2);
    assert_eq!(thread.len(), 5);
    assert_eq!(thread.dropped, 0);
    let walk: Vec<(usize, &str)> = depth_first(&thread.roots)
        .into_iter()
        .map(|(depth, reply)| (depth, reply.body.as_str()))
        .collect();
    assert_eq!(
        walk,
        vec![(0, "a"), (1, "a1"), (2, "a1x"), (0, "b"), (1, "b1")]
    );

    let unsaved = Question::new("draft", "no replies yet", forum.asker.id.unwrap());
    assert!(service.thread_for_question(&unsaved).unwrap().is_empty());
}

#[test]
fn thread_service_tolerates_parent_cycles() {
    let forum = setup();
    let question_id = forum.question.id.unwrap();
    let helper_id = forum.helper.id.unwrap();
    let repo = SqliteReplyRepository::try_new(&forum.conn).unwrap();

    let root = post(&repo, Reply::new(question_id, helper_id, "root"));
    let mut x = post(&repo, Reply::new(question_id, helper_id, "x"));
    let y = post(&repo, Reply::new_child(question_id, x.id.unwrap(), helper_id, "y"));
    x.parent_id = y.id;
    repo.save(&mut x).unwrap();

    let thread = ThreadService::new(repo)
        .thread_for_question(&forum.question)
        .unwrap();
    assert_eq!(thread.roots.len(), 1);
    assert_eq!(thread.roots[0].reply, root);
    assert!(thread.roots[0].children.is_empty());
    assert_eq!(thread.dropped, 2);
}

#[test]
fn thread_service_handles_long_reply_chain() {
    const DEPTH: i64 = 50_000;
    let forum = setup();
    let question_id = forum.question.id.unwrap();
    let helper_id = forum.helper.id.unwrap();

    forum
        .conn
        .execute(
            "INSERT INTO replies (id, question_id, parent_id, replier_id, body)
             WITH RECURSIVE chain(n) AS (
                SELECT 1
                UNION ALL
                SELECT n + 1 FROM chain WHERE n < ?2
             )
             SELECT n, ?1, CASE WHEN n = 1 THEN NULL ELSE n - 1 END, ?3, 'reply ' || n
             FROM chain;",
            [question_id, DEPTH, helper_id],
        )
        .unwrap();

    let repo = SqliteReplyRepository::try_new(&forum.conn).unwrap();
    let thread = ThreadService::new(repo)
        .thread_for_question(&forum.question)
        .unwrap();

    assert_eq!(thread.roots.len(), 1);
    assert_eq!(thread.len(), DEPTH as usize);
    assert_eq!(thread.dropped, 0);
    let walk = depth_first(&thread.roots);
    let (deepest, last) = walk[walk.len() - 1];
    assert_eq!(deepest, DEPTH as usize - 1);
    assert_eq!(last.id, Some(DEPTH));
}
