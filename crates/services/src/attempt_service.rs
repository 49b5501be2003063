use std::sync::Arc;

use lms_core::model::{Attempt, Lesson, LessonId, OptionId, QuizId, User, UserId};
use lms_core::progress::{AttemptIndex, LessonProgress};
use storage::repository::{AttemptRepository, LessonRepository};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::AttemptServiceError;
use crate::stats::LessonStats;

/// Records answers and derives progress from the attempt log.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            lessons,
            attempts,
        }
    }

    /// Append a prepared attempt to the log as-is.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` if the append fails.
    pub async fn submit_attempt(&self, attempt: &Attempt) -> Result<(), AttemptServiceError> {
        self.attempts.append_attempt(attempt).await?;
        info!(
            student = %attempt.student_id,
            lesson = %attempt.lesson_id,
            quiz = %attempt.quiz_id,
            correct = attempt.is_correct,
            "recorded attempt"
        );
        Ok(())
    }

    /// Answer one question for `student`, judging correctness from the lesson.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::NotAStudent` if the user cannot take quizzes.
    /// Returns `UnknownLesson`, `UnknownQuiz`, or `UnknownOption` when the
    /// answer does not resolve against the stored lesson.
    /// Returns `AttemptServiceError::Storage` if repository access fails.
    pub async fn answer(
        &self,
        student: &User,
        lesson_id: &LessonId,
        quiz_id: &QuizId,
        option_id: &OptionId,
    ) -> Result<Attempt, AttemptServiceError> {
        if !student.role.can_take_quizzes() {
            warn!(user = %student.id, role = %student.role, "rejected answer from non-student");
            return Err(AttemptServiceError::NotAStudent(student.id.clone()));
        }
        let lesson = self.require_lesson(lesson_id).await?;
        let quiz = lesson
            .find_quiz(quiz_id)
            .ok_or_else(|| AttemptServiceError::UnknownQuiz {
                lesson: lesson_id.clone(),
                quiz: quiz_id.clone(),
            })?;
        let option = quiz
            .option(option_id)
            .ok_or_else(|| AttemptServiceError::UnknownOption {
                quiz: quiz_id.clone(),
                option: option_id.clone(),
            })?;

        let mut attempt = Attempt::for_option(student.id.clone(), quiz, option, self.clock.now());
        // The log is keyed by the lesson the question was found in.
        attempt.lesson_id = lesson.id.clone();
        self.submit_attempt(&attempt).await?;
        Ok(attempt)
    }

    /// One student's attempts on one lesson, in log order.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` if repository access fails.
    pub async fn attempts_for(
        &self,
        student: &UserId,
        lesson: &LessonId,
    ) -> Result<Vec<Attempt>, AttemptServiceError> {
        let attempts = self.attempts.attempts_for(student, lesson).await?;
        debug!(student = %student, lesson = %lesson, count = attempts.len(), "loaded attempts");
        Ok(attempts)
    }

    /// Latest answer per question for one student on one lesson.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` if repository access fails.
    pub async fn attempt_index(
        &self,
        student: &UserId,
        lesson: &LessonId,
    ) -> Result<AttemptIndex, AttemptServiceError> {
        let attempts = self.attempts_for(student, lesson).await?;
        Ok(AttemptIndex::build(&attempts))
    }

    /// Progress of `student` on the lesson.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::UnknownLesson` if the lesson does not exist.
    /// Returns `AttemptServiceError::Storage` if repository access fails.
    pub async fn progress(
        &self,
        student: &UserId,
        lesson_id: &LessonId,
    ) -> Result<LessonProgress, AttemptServiceError> {
        let lesson = self.require_lesson(lesson_id).await?;
        self.progress_in(student, &lesson).await
    }

    /// Progress of `student` on an already loaded lesson.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` if repository access fails.
    pub async fn progress_in(
        &self,
        student: &UserId,
        lesson: &Lesson,
    ) -> Result<LessonProgress, AttemptServiceError> {
        let index = self.attempt_index(student, &lesson.id).await?;
        Ok(LessonProgress::from_index(lesson, &index))
    }

    /// Aggregate figures for one lesson across all students.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` if repository access fails.
    pub async fn lesson_stats(&self, lesson: &Lesson) -> Result<LessonStats, AttemptServiceError> {
        let log = self.attempts.attempts_for_lesson(&lesson.id).await?;
        Ok(LessonStats::compute(lesson, &log))
    }

    async fn require_lesson(&self, id: &LessonId) -> Result<Lesson, AttemptServiceError> {
        self.lessons
            .get_lesson(id)
            .await?
            .ok_or_else(|| AttemptServiceError::UnknownLesson(id.clone()))
    }
}
