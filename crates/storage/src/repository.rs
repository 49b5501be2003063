use async_trait::async_trait;
use lms_core::model::{Attempt, Lesson, LessonId, User, UserId};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Whether an upsert added a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Replaced,
}

/// Repository contract for the user directory.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// List users in the order they were first stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the users cannot be read.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    /// Fetch a user by ID, or `None` if unknown.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError>;

    /// Persist or replace a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored.
    async fn upsert_user(&self, user: &User) -> Result<SaveOutcome, StorageError>;
}

/// Repository contract for lessons and their quizzes.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// List lessons in the order they were first stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lessons cannot be read.
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError>;

    /// Fetch a lesson by ID, or `None` if unknown.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Store a lesson, replacing any lesson with the same ID wholesale.
    ///
    /// A replaced lesson keeps its position in `list_lessons`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<SaveOutcome, StorageError>;
}

/// Repository contract for the append-only attempt log.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append one attempt. Earlier attempts are never touched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if an attempt with the same ID is
    /// already logged, or another `StorageError` if it cannot be stored.
    async fn append_attempt(&self, attempt: &Attempt) -> Result<(), StorageError>;

    /// One student's attempts on one lesson, in log order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn attempts_for(
        &self,
        student: &UserId,
        lesson: &LessonId,
    ) -> Result<Vec<Attempt>, StorageError>;

    /// Every attempt on a lesson, in log order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn attempts_for_lesson(&self, lesson: &LessonId) -> Result<Vec<Attempt>, StorageError>;
}

/// Simple in-memory repository for tests and the default CLI store.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<Vec<User>>>,
    lessons: Arc<Mutex<Vec<Lesson>>>,
    attempts: Arc<Mutex<Vec<Attempt>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let guard = self.users.lock().map_err(lock_err)?;
        Ok(guard.clone())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        let guard = self.users.lock().map_err(lock_err)?;
        Ok(guard.iter().find(|u| &u.id == id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> Result<SaveOutcome, StorageError> {
        let mut guard = self.users.lock().map_err(lock_err)?;
        match guard.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(SaveOutcome::Replaced)
            }
            None => {
                guard.push(user.clone());
                Ok(SaveOutcome::Inserted)
            }
        }
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let guard = self.lessons.lock().map_err(lock_err)?;
        Ok(guard.clone())
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError> {
        let guard = self.lessons.lock().map_err(lock_err)?;
        Ok(guard.iter().find(|l| &l.id == id).cloned())
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<SaveOutcome, StorageError> {
        let mut guard = self.lessons.lock().map_err(lock_err)?;
        match guard.iter_mut().find(|l| l.id == lesson.id) {
            Some(existing) => {
                *existing = lesson.clone();
                Ok(SaveOutcome::Replaced)
            }
            None => {
                guard.push(lesson.clone());
                Ok(SaveOutcome::Inserted)
            }
        }
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        let mut guard = self.attempts.lock().map_err(lock_err)?;
        if guard.iter().any(|a| a.id == attempt.id) {
            return Err(StorageError::Conflict);
        }
        guard.push(attempt.clone());
        Ok(())
    }

    async fn attempts_for(
        &self,
        student: &UserId,
        lesson: &LessonId,
    ) -> Result<Vec<Attempt>, StorageError> {
        let guard = self.attempts.lock().map_err(lock_err)?;
        Ok(guard
            .iter()
            .filter(|a| a.belongs_to(student, lesson))
            .cloned()
            .collect())
    }

    async fn attempts_for_lesson(&self, lesson: &LessonId) -> Result<Vec<Attempt>, StorageError> {
        let guard = self.attempts.lock().map_err(lock_err)?;
        Ok(guard
            .iter()
            .filter(|a| &a.lesson_id == lesson)
            .cloned()
            .collect())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self {
            users,
            lessons,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::genesis_lesson;
    use lms_core::model::{AttemptId, OptionId, QuizId};
    use lms_core::time::fixed_now;

    fn attempt(student: &str, lesson: &str, quiz: &str) -> Attempt {
        Attempt {
            id: AttemptId::generate(),
            student_id: UserId::new(student),
            lesson_id: LessonId::new(lesson),
            quiz_id: QuizId::new(quiz),
            selected_option_id: OptionId::new("A"),
            is_correct: true,
            timestamp: fixed_now(),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_in_place() {
        let repo = InMemoryRepository::new();
        let first = genesis_lesson(fixed_now());
        let second = first.relabelled(LessonId::new("GENESIS-CH2"), "Second");
        assert_eq!(repo.upsert_lesson(&first).await.unwrap(), SaveOutcome::Inserted);
        assert_eq!(repo.upsert_lesson(&second).await.unwrap(), SaveOutcome::Inserted);

        let mut edited = first.clone();
        edited.title = "Edited".into();
        edited.note_quizzes.clear();
        assert_eq!(repo.upsert_lesson(&edited).await.unwrap(), SaveOutcome::Replaced);

        let lessons = repo.list_lessons().await.unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].title, "Edited");
        assert!(lessons[0].note_quizzes.is_empty());
        assert_eq!(lessons[1].id, LessonId::new("GENESIS-CH2"));
    }

    #[tokio::test]
    async fn unknown_lesson_is_none() {
        let repo = InMemoryRepository::new();
        let found = repo.get_lesson(&LessonId::new("nope")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn attempts_filter_by_student_and_lesson() {
        let repo = InMemoryRepository::new();
        repo.append_attempt(&attempt("s1", "L1", "Q1")).await.unwrap();
        repo.append_attempt(&attempt("s2", "L1", "Q1")).await.unwrap();
        repo.append_attempt(&attempt("s1", "L2", "Q1")).await.unwrap();
        repo.append_attempt(&attempt("s1", "L1", "Q2")).await.unwrap();

        let mine = repo
            .attempts_for(&UserId::new("s1"), &LessonId::new("L1"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[1].quiz_id, QuizId::new("Q2"));

        let lesson = repo.attempts_for_lesson(&LessonId::new("L1")).await.unwrap();
        assert_eq!(lesson.len(), 3);
    }

    #[tokio::test]
    async fn same_answer_twice_is_two_entries_but_same_id_conflicts() {
        let repo = InMemoryRepository::new();
        let first = attempt("s1", "L1", "Q1");
        let again = Attempt {
            id: AttemptId::generate(),
            ..first.clone()
        };
        repo.append_attempt(&first).await.unwrap();
        repo.append_attempt(&again).await.unwrap();
        assert!(matches!(
            repo.append_attempt(&first).await,
            Err(StorageError::Conflict)
        ));

        let log = repo.attempts_for_lesson(&LessonId::new("L1")).await.unwrap();
        assert_eq!(log, vec![first, again]);
    }

    #[tokio::test]
    async fn storage_shares_one_backend() {
        let storage = Storage::in_memory();
        storage
            .lessons
            .upsert_lesson(&genesis_lesson(fixed_now()))
            .await
            .unwrap();
        assert_eq!(storage.lessons.list_lessons().await.unwrap().len(), 1);
        assert!(storage.users.list_users().await.unwrap().is_empty());
    }
}
