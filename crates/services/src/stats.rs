//! Per-lesson aggregate figures for staff views.

use std::collections::BTreeSet;

use lms_core::model::{Attempt, Lesson, UserId};
use lms_core::progress::{AttemptIndex, LessonProgress, rounded_percent};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LessonStats {
    /// Every attempt logged against the lesson, retries included.
    pub total_attempts: usize,
    /// Correct attempts over all attempts, as a rounded percentage.
    pub avg_score: u8,
    /// Share of participating students who have answered every question.
    pub completion_rate: u8,
}

impl LessonStats {
    /// Computes stats from the lesson's slice of the attempt log.
    ///
    /// Attempts on other lessons are ignored. With no attempts every figure is 0.
    #[must_use]
    pub fn compute(lesson: &Lesson, log: &[Attempt]) -> Self {
        let attempts: Vec<&Attempt> = log.iter().filter(|a| a.lesson_id == lesson.id).collect();
        if attempts.is_empty() {
            return Self::default();
        }

        let correct = attempts.iter().filter(|a| a.is_correct).count();
        let students: BTreeSet<&UserId> = attempts.iter().map(|a| &a.student_id).collect();
        let completed = students
            .iter()
            .filter(|&&student| {
                let index = AttemptIndex::build(
                    attempts.iter().copied().filter(|a| &a.student_id == student),
                );
                LessonProgress::from_index(lesson, &index).is_complete()
            })
            .count();

        Self {
            total_attempts: attempts.len(),
            avg_score: rounded_percent(correct, attempts.len()),
            completion_rate: rounded_percent(completed, students.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{AttemptId, LessonId, OptionId, QuizId};
    use lms_core::time::fixed_now;
    use storage::seed::genesis_lesson;

    fn attempt(student: &str, lesson: &str, quiz: &str, is_correct: bool) -> Attempt {
        Attempt {
            id: AttemptId::generate(),
            student_id: UserId::new(student),
            lesson_id: LessonId::new(lesson),
            quiz_id: QuizId::new(quiz),
            selected_option_id: OptionId::new(if is_correct { "A" } else { "C" }),
            is_correct,
            timestamp: fixed_now(),
        }
    }

    #[test]
    fn no_attempts_is_all_zero() {
        let lesson = genesis_lesson(fixed_now());
        assert_eq!(LessonStats::compute(&lesson, &[]), LessonStats::default());
    }

    #[test]
    fn averages_every_attempt_and_counts_finishers() {
        let lesson = genesis_lesson(fixed_now());
        let log = vec![
            attempt("s1", "GENESIS-CH1", "GEN1-Q1", true),
            attempt("s1", "GENESIS-CH1", "GEN1-Q2", false),
            attempt("s1", "GENESIS-CH1", "NOTE-Q1", true),
            attempt("s2", "GENESIS-CH1", "GEN1-Q1", false),
            attempt("s3", "OTHER", "GEN1-Q1", true),
        ];

        let stats = LessonStats::compute(&lesson, &log);
        assert_eq!(stats.total_attempts, 4);
        assert_eq!(stats.avg_score, 50);
        // s1 finished, s2 did not.
        assert_eq!(stats.completion_rate, 50);
    }

    #[test]
    fn avg_score_rounds_to_nearest() {
        let lesson = genesis_lesson(fixed_now());
        let log = vec![
            attempt("s1", "GENESIS-CH1", "GEN1-Q1", true),
            attempt("s1", "GENESIS-CH1", "GEN1-Q2", true),
            attempt("s1", "GENESIS-CH1", "GEN1-Q2", false),
        ];
        let stats = LessonStats::compute(&lesson, &log);
        assert_eq!(stats.avg_score, 67);
        assert_eq!(stats.completion_rate, 0);
    }
}
