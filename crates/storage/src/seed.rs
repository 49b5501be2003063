//! Demo users and the bundled Genesis 1 lesson.

use chrono::{DateTime, Utc};
use lms_core::model::{
    LeadershipNote, Lesson, LessonId, LessonType, QuestionType, Quiz, QuizId, QuizOption, Role,
    User,
};
use tracing::info;

use crate::repository::{SaveOutcome, Storage, StorageError};

pub const GENESIS_LESSON_ID: &str = "GENESIS-CH1";

const GENESIS_NOTE_BODY: &str = r#"
<h2>The Foundation of Leadership: Order from Chaos</h2>
<p>In the beginning, the earth was formless and empty. This state of "tohu wa-bohu" (formless and void) represents the starting point of many leadership challenges. A true leader does not shy away from chaos but rather sees it as an opportunity to establish order, purpose, and beauty.</p>
<h3>Vision Precedes Action</h3>
<p>Leadership begins with vision. "And God said, 'Let there be light.'" Before any physical work was done, the vision was articulated. Effective leadership is communicative and intentional. It speaks into the darkness and defines the direction before mobilizing resources.</p>
<h3>The Principle of Separation</h3>
<p>Creation involved separation: light from darkness, water from land, day from night. Leadership often requires making clear distinctions, setting boundaries and defining roles.</p>
<h3>Delegation and Empowerment</h3>
<p>Later in the creation narrative, God empowers humanity to "be fruitful and multiply." True leaders do not hoard authority; they distribute it to empower others to continue the work of cultivation and expansion.</p>
"#;

/// The fixed user directory: one admin, one student, one mentor.
#[must_use]
pub fn demo_users() -> Vec<User> {
    vec![
        User::new("admin1", "Sarah Admin", "sarah@lms.com", Role::Admin)
            .with_avatar("https://i.pravatar.cc/150?u=sarah"),
        User::new("student1", "John Student", "john@lms.com", Role::Student)
            .with_avatar("https://i.pravatar.cc/150?u=john"),
        User::new("mentor1", "Mike Mentor", "mike@lms.com", Role::Mentor)
            .with_avatar("https://i.pravatar.cc/150?u=mike"),
    ]
}

fn option(label: &str, text: &str, is_correct: bool, explanation: &str) -> QuizOption {
    QuizOption::new(label, text, is_correct, explanation)
}

fn quiz(
    id: &str,
    set: QuestionType,
    reference: &str,
    text: &str,
    sequence_number: u32,
    options: Vec<QuizOption>,
) -> Quiz {
    Quiz {
        id: QuizId::new(id),
        lesson_id: LessonId::new(GENESIS_LESSON_ID),
        question_type: set,
        reference: Some(reference.to_owned()),
        question_text: text.to_owned(),
        sequence_number,
        options,
    }
}

/// Genesis chapter 1 with two bible questions and one note question.
#[must_use]
pub fn genesis_lesson(created_at: DateTime<Utc>) -> Lesson {
    Lesson {
        id: LessonId::new(GENESIS_LESSON_ID),
        title: "The Beginning of Wisdom: Genesis 1".into(),
        description:
            "A study of Genesis chapter 1 with leadership insights regarding creation and order."
                .into(),
        book: Some("Genesis".into()),
        chapter: Some(1),
        lesson_type: LessonType::Mixed,
        leadership_note: LeadershipNote {
            title: "The Leadership Mindset in Creation".into(),
            body: GENESIS_NOTE_BODY.trim().to_owned(),
        },
        created_at,
        bible_quizzes: vec![
            quiz(
                "GEN1-Q1",
                QuestionType::BibleQuiz,
                "Genesis 1:1",
                "According to Genesis 1:1, what did God create in the beginning?",
                1,
                vec![
                    option(
                        "A",
                        "Heaven and Earth",
                        true,
                        "Correct: the verse states \"God created the heaven and the earth.\"",
                    ),
                    option("B", "Light", false, "Light was created later in verse 3."),
                    option("C", "Plants", false, "Plants were created later in the chapter."),
                    option("D", "Animals", false, "Animals were created later in the chapter."),
                ],
            ),
            quiz(
                "GEN1-Q2",
                QuestionType::BibleQuiz,
                "Genesis 1:3",
                "What was the first thing God spoke into existence?",
                2,
                vec![
                    option("A", "Man", false, "Man was created on the sixth day."),
                    option(
                        "B",
                        "Light",
                        true,
                        "Correct: God said \"Let there be light\".",
                    ),
                    option("C", "Water", false, "Water existed but was separated later."),
                    option("D", "Stars", false, "Stars were created on the fourth day."),
                ],
            ),
        ],
        note_quizzes: vec![quiz(
            "NOTE-Q1",
            QuestionType::NoteQuiz,
            "Leadership Note",
            "What leadership quality is demonstrated by God's orderly creation process?",
            1,
            vec![
                option(
                    "A",
                    "Strategic planning",
                    true,
                    "Correct: the note emphasizes deliberate sequencing and separation.",
                ),
                option("B", "Impulsiveness", false, "Creation was deliberate, not impulsive."),
                option(
                    "C",
                    "Indecision",
                    false,
                    "God spoke with absolute authority and decision.",
                ),
                option(
                    "D",
                    "Fearfulness",
                    false,
                    "Fear is not present in the creation account.",
                ),
            ],
        )],
    }
}

/// What `ensure_seed_data` inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_added: usize,
    pub lessons_added: usize,
}

/// Seeds the demo users into an empty user directory and the Genesis lesson
/// into an empty lesson store. Stores that already hold data are left alone.
///
/// # Errors
///
/// Returns `StorageError` on repository failures.
pub async fn ensure_seed_data(
    storage: &Storage,
    now: DateTime<Utc>,
) -> Result<SeedReport, StorageError> {
    let mut report = SeedReport::default();

    if storage.users.list_users().await?.is_empty() {
        for user in demo_users() {
            if storage.users.upsert_user(&user).await? == SaveOutcome::Inserted {
                report.users_added += 1;
            }
        }
    }

    if storage.lessons.list_lessons().await?.is_empty() {
        storage.lessons.upsert_lesson(&genesis_lesson(now)).await?;
        report.lessons_added += 1;
    }

    if report != SeedReport::default() {
        info!(
            users = report.users_added,
            lessons = report.lessons_added,
            "seeded demo data"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::time::fixed_now;

    #[test]
    fn genesis_lesson_is_self_consistent() {
        let lesson = genesis_lesson(fixed_now());
        assert!(lesson.foreign_quizzes().is_empty());
        assert_eq!(lesson.bible_quizzes.len(), 2);
        assert_eq!(lesson.note_quizzes.len(), 1);
        for quiz in lesson.all_quizzes() {
            assert_eq!(quiz.options.iter().filter(|o| o.is_correct).count(), 1);
        }
    }

    #[test]
    fn demo_directory_has_no_parent() {
        let users = demo_users();
        assert_eq!(users[0].role, Role::Admin);
        assert!(users.iter().all(|u| u.role != Role::Parent));
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let storage = Storage::in_memory();
        let first = ensure_seed_data(&storage, fixed_now()).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                users_added: 3,
                lessons_added: 1
            }
        );

        let second = ensure_seed_data(&storage, fixed_now()).await.unwrap();
        assert_eq!(second, SeedReport::default());
        assert_eq!(storage.lessons.list_lessons().await.unwrap().len(), 1);
    }
}
