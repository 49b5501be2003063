use std::sync::Arc;

use lms_core::builder::LessonDraft;
use lms_core::model::{Lesson, LessonId};
use storage::repository::{LessonRepository, SaveOutcome};
use tracing::{info, warn};

use crate::Clock;
use crate::error::LessonServiceError;

/// Reads and writes the curriculum.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
}

impl LessonService {
    #[must_use]
    pub fn new(clock: Clock, lessons: Arc<dyn LessonRepository>) -> Self {
        Self { clock, lessons }
    }

    /// All lessons in the order they were first saved.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn list_lessons(&self) -> Result<Vec<Lesson>, LessonServiceError> {
        Ok(self.lessons.list_lessons().await?)
    }

    /// Fetch a lesson by ID.
    ///
    /// Returns `Ok(None)` when the lesson does not exist.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, LessonServiceError> {
        Ok(self.lessons.get_lesson(id).await?)
    }

    /// Store a lesson. An existing lesson with the same ID is replaced in place,
    /// otherwise the lesson is appended.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if persistence fails.
    pub async fn save_lesson(&self, lesson: &Lesson) -> Result<SaveOutcome, LessonServiceError> {
        let foreign = lesson.foreign_quizzes();
        if !foreign.is_empty() {
            warn!(lesson = %lesson.id, count = foreign.len(), "saving quizzes that point at another lesson");
        }
        let outcome = self.lessons.upsert_lesson(lesson).await?;
        info!(lesson = %lesson.id, ?outcome, questions = lesson.question_count(), "saved lesson");
        Ok(outcome)
    }

    /// Validate a draft, stamp it with the current time, and save it.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Build` if the draft is incomplete.
    /// Returns `LessonServiceError::Storage` if persistence fails.
    pub async fn create_from_draft(
        &self,
        draft: LessonDraft,
    ) -> Result<(Lesson, SaveOutcome), LessonServiceError> {
        let lesson = draft.build(self.clock.now())?;
        let outcome = self.save_lesson(&lesson).await?;
        Ok((lesson, outcome))
    }

    /// Number of lessons currently stored.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn lesson_count(&self) -> Result<usize, LessonServiceError> {
        Ok(self.lessons.list_lessons().await?.len())
    }
}
