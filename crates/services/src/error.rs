//! Shared error types for the services crate.

use thiserror::Error;

use lms_core::builder::BuildError;
use lms_core::model::{LessonId, OptionId, QuizId, UserId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::import::ImportStep;

/// Errors emitted while loading a `Session`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("the user directory is empty")]
    NoUsers,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AttemptService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptServiceError {
    #[error("unknown lesson: {0}")]
    UnknownLesson(LessonId),
    #[error("lesson {lesson} has no question {quiz}")]
    UnknownQuiz { lesson: LessonId, quiz: QuizId },
    #[error("question {quiz} has no option {option}")]
    UnknownOption { quiz: QuizId, option: OptionId },
    #[error("user {0} cannot take quizzes")]
    NotAStudent(UserId),
    #[error("question {0} is already answered")]
    AlreadyAnswered(QuizId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the lesson import wizard.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("import is at the {actual} step, expected {expected}")]
    WrongStep {
        expected: ImportStep,
        actual: ImportStep,
    },
    #[error(transparent)]
    Lesson(#[from] LessonServiceError),
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error(transparent)]
    Lesson(#[from] LessonServiceError),
    #[error(transparent)]
    Attempt(#[from] AttemptServiceError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
