use chrono::Duration;
use lms_core::model::{
    Attempt, AttemptId, LessonId, OptionId, QuestionType, QuizId, Role, User, UserId,
};
use lms_core::time::fixed_now;
use storage::repository::{AttemptRepository, LessonRepository, SaveOutcome, UserRepository};
use storage::seed::{GENESIS_LESSON_ID, ensure_seed_data, genesis_lesson};
use storage::sqlite::SqliteRepository;
use storage::Storage;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn attempt(student: &str, quiz: &str, option: &str, is_correct: bool, offset: i64) -> Attempt {
    Attempt {
        id: AttemptId::generate(),
        student_id: UserId::new(student),
        lesson_id: LessonId::new(GENESIS_LESSON_ID),
        quiz_id: QuizId::new(quiz),
        selected_option_id: OptionId::new(option),
        is_correct,
        timestamp: fixed_now() + Duration::seconds(offset),
    }
}

#[tokio::test]
async fn sqlite_roundtrip_keeps_quizzes_and_options() {
    let repo = connect("memdb_lesson_roundtrip").await;
    let lesson = genesis_lesson(fixed_now());

    let outcome = repo.upsert_lesson(&lesson).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Inserted);

    let fetched = repo
        .get_lesson(&lesson.id)
        .await
        .unwrap()
        .expect("lesson stored");
    assert_eq!(fetched, lesson);
    assert_eq!(fetched.quizzes(QuestionType::BibleQuiz).len(), 2);
    assert_eq!(fetched.quizzes(QuestionType::NoteQuiz).len(), 1);

    let missing = repo.get_lesson(&LessonId::new("NOPE")).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn sqlite_replace_keeps_position_and_count() {
    let repo = connect("memdb_lesson_replace").await;
    let genesis = genesis_lesson(fixed_now());
    let second = genesis.relabelled(LessonId::new("GENESIS-CH2"), "Imported Lesson 2");

    repo.upsert_lesson(&genesis).await.unwrap();
    repo.upsert_lesson(&second).await.unwrap();

    let mut edited = genesis.clone();
    edited.title = "Edited".into();
    edited.note_quizzes.clear();
    let outcome = repo.upsert_lesson(&edited).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Replaced);

    let lessons = repo.list_lessons().await.unwrap();
    assert_eq!(lessons.len(), 2);
    assert_eq!(lessons[0].id, genesis.id);
    assert_eq!(lessons[0].title, "Edited");
    assert!(lessons[0].note_quizzes.is_empty());
    assert_eq!(lessons[0].bible_quizzes.len(), 2);
    assert_eq!(lessons[1], second);
}

#[tokio::test]
async fn sqlite_attempts_come_back_in_log_order() {
    let repo = connect("memdb_attempt_log").await;
    let first = attempt("student1", "GEN1-Q1", "B", false, 0);
    let second = attempt("student1", "GEN1-Q1", "A", true, 1);
    let other = attempt("student2", "GEN1-Q1", "A", true, 2);

    repo.append_attempt(&first).await.unwrap();
    repo.append_attempt(&second).await.unwrap();
    repo.append_attempt(&other).await.unwrap();

    let mine = repo
        .attempts_for(&UserId::new("student1"), &LessonId::new(GENESIS_LESSON_ID))
        .await
        .unwrap();
    assert_eq!(mine, vec![first.clone(), second.clone()]);

    let all = repo
        .attempts_for_lesson(&LessonId::new(GENESIS_LESSON_ID))
        .await
        .unwrap();
    assert_eq!(all, vec![first, second, other]);

    let none = repo
        .attempts_for(&UserId::new("student1"), &LessonId::new("OTHER"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn sqlite_rejects_duplicate_attempt_ids() {
    let repo = connect("memdb_attempt_dupe").await;
    let first = attempt("student1", "GEN1-Q1", "A", true, 0);
    repo.append_attempt(&first).await.unwrap();

    let err = repo.append_attempt(&first).await.unwrap_err();
    assert!(matches!(err, storage::StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_users_upsert_in_place() {
    let repo = connect("memdb_users").await;
    let admin = User::new("admin1", "Sarah Admin", "sarah@lms.com", Role::Admin);
    let student = User::new("student1", "John Student", "john@lms.com", Role::Student)
        .with_avatar("https://i.pravatar.cc/150?u=john");

    assert_eq!(repo.upsert_user(&admin).await.unwrap(), SaveOutcome::Inserted);
    assert_eq!(repo.upsert_user(&student).await.unwrap(), SaveOutcome::Inserted);

    let renamed = User::new("admin1", "Sara Admin", "sara@lms.com", Role::Admin);
    assert_eq!(repo.upsert_user(&renamed).await.unwrap(), SaveOutcome::Replaced);

    let users = repo.list_users().await.unwrap();
    assert_eq!(users, vec![renamed, student.clone()]);
    assert_eq!(
        repo.get_user(&UserId::new("student1")).await.unwrap(),
        Some(student)
    );
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent_and_seed_once() {
    let storage = Storage::sqlite("sqlite:file:memdb_seed?mode=memory&cache=shared")
        .await
        .expect("storage");
    let repo = connect("memdb_seed").await;
    repo.migrate().await.expect("second migrate");

    let first = ensure_seed_data(&storage, fixed_now()).await.unwrap();
    assert_eq!(first.users_added, 3);
    assert_eq!(first.lessons_added, 1);

    let second = ensure_seed_data(&storage, fixed_now()).await.unwrap();
    assert_eq!(second.users_added, 0);
    assert_eq!(second.lessons_added, 0);

    let users = storage.users.list_users().await.unwrap();
    assert_eq!(users[0].id.as_str(), "admin1");
}

#[tokio::test]
async fn sqlite_creates_a_missing_database_file() {
    let dir = std::env::temp_dir().join(format!("lms-fresh-db-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("lms.sqlite3");
    assert!(!path.exists());
    let url = format!("sqlite:{}", path.display());

    let storage = Storage::sqlite(&url).await.expect("fresh file opens");
    let report = ensure_seed_data(&storage, fixed_now()).await.unwrap();
    assert_eq!(report.lessons_added, 1);
    assert!(path.exists());
    drop(storage);

    let reopened = Storage::sqlite(&url).await.expect("existing file opens");
    let lessons = reopened.lessons.list_lessons().await.unwrap();
    assert_eq!(lessons.len(), 1);
    drop(reopened);

    let _ = std::fs::remove_dir_all(&dir);
}
