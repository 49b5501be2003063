use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, LessonId, OptionId, QuizId, UserId};
use crate::model::lesson::{Quiz, QuizOption};

/// One student's answer to one question.
///
/// Attempts are append-only. Several may exist for the same
/// (student, quiz) pair; readers resolve them with
/// [`AttemptIndex`](crate::progress::AttemptIndex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub student_id: UserId,
    pub lesson_id: LessonId,
    pub quiz_id: QuizId,
    pub selected_option_id: OptionId,
    pub is_correct: bool,
    pub timestamp: DateTime<Utc>,
}

impl Attempt {
    /// Builds an attempt whose correctness is taken from the chosen option.
    #[must_use]
    pub fn for_option(
        student_id: UserId,
        quiz: &Quiz,
        option: &QuizOption,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AttemptId::generate(),
            student_id,
            lesson_id: quiz.lesson_id.clone(),
            quiz_id: quiz.id.clone(),
            selected_option_id: option.id.clone(),
            is_correct: option.is_correct,
            timestamp,
        }
    }

    #[must_use]
    pub fn belongs_to(&self, student_id: &UserId, lesson_id: &LessonId) -> bool {
        &self.student_id == student_id && &self.lesson_id == lesson_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;
    use crate::time::fixed_now;

    #[test]
    fn correctness_comes_from_option() {
        let quiz = Quiz {
            id: QuizId::new("Q1"),
            lesson_id: LessonId::new("L1"),
            question_type: QuestionType::BibleQuiz,
            reference: None,
            question_text: "?".into(),
            sequence_number: 1,
            options: vec![
                QuizOption::new("A", "yes", true, ""),
                QuizOption::new("B", "no", false, ""),
            ],
        };

        let right = Attempt::for_option(UserId::new("s1"), &quiz, &quiz.options[0], fixed_now());
        let wrong = Attempt::for_option(UserId::new("s1"), &quiz, &quiz.options[1], fixed_now());

        assert!(right.is_correct);
        assert!(!wrong.is_correct);
        assert_eq!(wrong.selected_option_id, OptionId::new("B"));
        assert_ne!(right.id, wrong.id);
        assert!(right.belongs_to(&UserId::new("s1"), &LessonId::new("L1")));
        assert!(!right.belongs_to(&UserId::new("s2"), &LessonId::new("L1")));
    }
}
