use storage::repository::{FolderRecord, QuestionRecord, SessionRecord, Storage};
use study_core::model::{Folder, FolderId, Question, QuestionId, SessionId, StudySession};
use study_core::time::fixed_now;

fn build_question(n: usize) -> Question {
    Question::new(
        QuestionId::new(format!("q-{n}")),
        format!("question {n}"),
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
        n % 4,
        format!("explanation {n}"),
    )
    .unwrap()
}

fn build_session(id: &str, offset_hours: i64) -> StudySession {
    StudySession::new(
        SessionId::new(id),
        format!("Session {id}"),
        "source text",
        "### Summary",
        (0..10).map(build_question).collect(),
        fixed_now() + chrono::Duration::hours(offset_hours),
    )
    .unwrap()
}

#[tokio::test]
async fn session_round_trip_and_field_updates() {
    let storage = Storage::sqlite("sqlite:file:memdb_sessions?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");

    let session = build_session("s-1", 0);
    storage
        .sessions
        .insert_session(&SessionRecord::from_session("u-1", &session))
        .await
        .expect("insert");

    storage
        .sessions
        .update_score(session.id(), 7)
        .await
        .expect("update score");
    storage
        .sessions
        .update_title(session.id(), "Renamed")
        .await
        .expect("update title");
    storage
        .sessions
        .update_favorite(session.id(), true)
        .await
        .expect("update favorite");

    let listed = storage.sessions.list_sessions("u-1").await.expect("list");
    assert_eq!(listed.len(), 1);
    let record = &listed[0];
    assert_eq!(record.score, 7);
    assert_eq!(record.title, "Renamed");
    assert!(record.is_favorite);

    let restored = listed
        .into_iter()
        .next()
        .unwrap()
        .into_session()
        .expect("rehydrate");
    assert_eq!(restored.score(), 7);
    assert_eq!(restored.total_questions(), 10);
    assert_eq!(restored.questions().len(), 10);
    assert_eq!(restored.questions()[3].correct_answer_index(), 3);
}

#[tokio::test]
async fn list_sessions_orders_newest_first() {
    let storage = Storage::sqlite("sqlite:file:memdb_ordering?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");

    for (id, offset) in [("s-a", 0), ("s-b", 2), ("s-c", 1)] {
        storage
            .sessions
            .insert_session(&SessionRecord::from_session("u-1", &build_session(id, offset)))
            .await
            .expect("insert");
    }

    let listed = storage.sessions.list_sessions("u-1").await.expect("list");
    let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["s-b", "s-c", "s-a"]);
}

#[tokio::test]
async fn regeneration_write_is_atomic() {
    let storage = Storage::sqlite("sqlite:file:memdb_regen?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");

    let session = build_session("s-1", 0);
    storage
        .sessions
        .insert_session(&SessionRecord::from_session("u-1", &session))
        .await
        .expect("insert");
    storage
        .sessions
        .update_score(session.id(), 9)
        .await
        .expect("score");

    let replacement: Vec<QuestionRecord> = (0..4)
        .map(|n| QuestionRecord::from_question(&build_question(n)))
        .collect();
    storage
        .sessions
        .update_questions(session.id(), &replacement)
        .await
        .expect("replace questions");

    let listed = storage.sessions.list_sessions("u-1").await.expect("list");
    let record = &listed[0];
    assert_eq!(record.score, 0);
    assert_eq!(record.total_questions, 4);
    assert_eq!(record.questions.len(), 4);
}

#[tokio::test]
async fn folder_membership_round_trip() {
    let storage = Storage::sqlite("sqlite:file:memdb_folders?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");

    let mut folder = Folder::new(FolderId::new("f-1"), "Exams").unwrap();
    folder.add_session(SessionId::new("s-1"));
    storage
        .folders
        .insert_folder(&FolderRecord::from_folder("u-1", &folder))
        .await
        .expect("insert folder");

    folder.add_session(SessionId::new("s-2"));
    storage
        .folders
        .update_folder_sessions(folder.id(), folder.session_ids())
        .await
        .expect("update membership");

    let listed = storage.folders.list_folders("u-1").await.expect("list");
    assert_eq!(listed.len(), 1);
    let restored = listed
        .into_iter()
        .next()
        .unwrap()
        .into_folder()
        .expect("rehydrate");
    assert_eq!(restored.name(), "Exams");
    assert!(restored.contains(&SessionId::new("s-1")));
    assert!(restored.contains(&SessionId::new("s-2")));
}
