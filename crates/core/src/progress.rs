//! Quiz scoring and lesson progress.
//!
//! Progress is always derived from the attempt log; nothing here is stored.
//! When the log holds several attempts for one question, the one that comes
//! last in log order is the one that counts.

use std::collections::HashMap;

use crate::model::{Attempt, LessonId, Lesson, OptionId, QuestionType, Quiz, QuizId, UserId};

//
// ─── ATTEMPT INDEX ─────────────────────────────────────────────────────────────
//

/// The answer that currently stands for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub option_id: OptionId,
    pub is_correct: bool,
}

impl From<&Attempt> for AttemptOutcome {
    fn from(attempt: &Attempt) -> Self {
        Self {
            option_id: attempt.selected_option_id.clone(),
            is_correct: attempt.is_correct,
        }
    }
}

/// Latest outcome per question, built from an attempt log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptIndex {
    latest: HashMap<QuizId, AttemptOutcome>,
}

impl AttemptIndex {
    /// Builds the index from attempts in log order; later entries overwrite earlier ones.
    pub fn build<'a>(attempts: impl IntoIterator<Item = &'a Attempt>) -> Self {
        let mut index = Self::default();
        for attempt in attempts {
            index.record(attempt.quiz_id.clone(), AttemptOutcome::from(attempt));
        }
        index
    }

    /// Builds the index from the full log, keeping only one student's attempts on one lesson.
    #[must_use]
    pub fn for_student_lesson(student: &UserId, lesson: &LessonId, log: &[Attempt]) -> Self {
        Self::build(log.iter().filter(|a| a.belongs_to(student, lesson)))
    }

    pub fn record(&mut self, quiz_id: QuizId, outcome: AttemptOutcome) {
        self.latest.insert(quiz_id, outcome);
    }

    #[must_use]
    pub fn get(&self, quiz_id: &QuizId) -> Option<&AttemptOutcome> {
        self.latest.get(quiz_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

//
// ─── QUIZ PROGRESS ─────────────────────────────────────────────────────────────
//

/// Attempted / correct / total counts for an ordered list of questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizProgress {
    pub attempted: usize,
    pub correct: usize,
    pub total: usize,
}

impl QuizProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.attempted == self.total
    }

    /// Share of attempted questions answered correctly, as a rounded percentage.
    #[must_use]
    pub fn score_percent(&self) -> u8 {
        rounded_percent(self.correct, self.attempted)
    }

    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            attempted: self.attempted + other.attempted,
            correct: self.correct + other.correct,
            total: self.total + other.total,
        }
    }
}

/// Counts how many of `questions` have a standing attempt, and how many of those are correct.
///
/// Questions with no entry in `index` count as not attempted. An empty list
/// yields all zeros.
#[must_use]
pub fn progress(questions: &[Quiz], index: &AttemptIndex) -> QuizProgress {
    let mut out = QuizProgress {
        total: questions.len(),
        ..QuizProgress::default()
    };
    for quiz in questions {
        if let Some(outcome) = index.get(&quiz.id) {
            out.attempted += 1;
            if outcome.is_correct {
                out.correct += 1;
            }
        }
    }
    out
}

/// [`progress`] over the full log, filtered to one student and lesson.
#[must_use]
pub fn progress_for(
    student: &UserId,
    lesson: &LessonId,
    questions: &[Quiz],
    log: &[Attempt],
) -> QuizProgress {
    progress(questions, &AttemptIndex::for_student_lesson(student, lesson, log))
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// Progress across both question sets of a lesson.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonProgress {
    pub bible: QuizProgress,
    pub note: QuizProgress,
}

impl LessonProgress {
    #[must_use]
    pub fn from_index(lesson: &Lesson, index: &AttemptIndex) -> Self {
        Self {
            bible: progress(&lesson.bible_quizzes, index),
            note: progress(&lesson.note_quizzes, index),
        }
    }

    #[must_use]
    pub fn for_set(&self, set: QuestionType) -> QuizProgress {
        match set {
            QuestionType::BibleQuiz => self.bible,
            QuestionType::NoteQuiz => self.note,
        }
    }

    #[must_use]
    pub fn combined(&self) -> QuizProgress {
        self.bible.combine(self.note)
    }

    /// Attempted over total across both sets, rounded; 0 for a lesson with no questions.
    #[must_use]
    pub fn percent_complete(&self) -> u8 {
        let all = self.combined();
        rounded_percent(all.attempted, all.total)
    }

    /// True once every question has an attempt. A lesson without questions is never complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let all = self.combined();
        all.total > 0 && all.is_complete()
    }
}

/// `part / whole` as a percentage, rounding halves up. Returns 0 when `whole` is 0.
#[must_use]
pub fn rounded_percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u128;
    let whole = whole as u128;
    let pct = (part * 200 + whole) / (whole * 2);
    u8::try_from(pct).unwrap_or(100)
}
