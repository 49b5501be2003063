//! A student working through one lesson.
//!
//! The view loads the student's standing answers once and then tracks new
//! answers locally, so progress stays current without re-reading the log.
//! A question that already has an answer is locked.

use lms_core::model::{Attempt, Lesson, OptionId, QuizId, User};
use lms_core::progress::{AttemptIndex, AttemptOutcome, LessonProgress};

use crate::attempt_service::AttemptService;
use crate::error::AttemptServiceError;

#[derive(Debug, Clone)]
pub struct LessonView {
    student: User,
    lesson: Lesson,
    answers: AttemptIndex,
}

impl LessonView {
    /// Open `lesson` for `student`, loading their earlier answers.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` if the attempt log cannot be read.
    pub async fn open(
        attempts: &AttemptService,
        student: User,
        lesson: Lesson,
    ) -> Result<Self, AttemptServiceError> {
        let answers = attempts.attempt_index(&student.id, &lesson.id).await?;
        Ok(Self {
            student,
            lesson,
            answers,
        })
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn student(&self) -> &User {
        &self.student
    }

    /// The standing answer for a question, if any.
    #[must_use]
    pub fn previous_answer(&self, quiz_id: &QuizId) -> Option<&AttemptOutcome> {
        self.answers.get(quiz_id)
    }

    #[must_use]
    pub fn is_locked(&self, quiz_id: &QuizId) -> bool {
        self.answers.get(quiz_id).is_some()
    }

    #[must_use]
    pub fn progress(&self) -> LessonProgress {
        LessonProgress::from_index(&self.lesson, &self.answers)
    }

    /// Answer a question that has no answer yet.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::AlreadyAnswered` if the question is locked.
    /// Otherwise returns whatever `AttemptService::answer` returns.
    pub async fn answer(
        &mut self,
        attempts: &AttemptService,
        quiz_id: &QuizId,
        option_id: &OptionId,
    ) -> Result<Attempt, AttemptServiceError> {
        if self.is_locked(quiz_id) {
            return Err(AttemptServiceError::AlreadyAnswered(quiz_id.clone()));
        }
        let attempt = attempts
            .answer(&self.student, &self.lesson.id, quiz_id, option_id)
            .await?;
        self.answers
            .record(attempt.quiz_id.clone(), AttemptOutcome::from(&attempt));
        Ok(attempt)
    }
}
