use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::{LessonId, OptionId, QuizId};

//
// ─── KINDS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LessonType {
    Bible,
    Leadership,
    Mixed,
}

impl LessonType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonType::Bible => "Bible",
            LessonType::Leadership => "Leadership",
            LessonType::Mixed => "Mixed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Bible" => Some(LessonType::Bible),
            "Leadership" => Some(LessonType::Leadership),
            "Mixed" => Some(LessonType::Mixed),
            _ => None,
        }
    }
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which of a lesson's two question sets a quiz belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "Bible Quiz")]
    BibleQuiz,
    #[serde(rename = "Note Quiz")]
    NoteQuiz,
}

impl QuestionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::BibleQuiz => "Bible Quiz",
            QuestionType::NoteQuiz => "Note Quiz",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Bible Quiz" => Some(QuestionType::BibleQuiz),
            "Note Quiz" => Some(QuestionType::NoteQuiz),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: OptionId,
    pub text: String,
    pub is_correct: bool,
    pub explanation: String,
}

impl QuizOption {
    #[must_use]
    pub fn new(
        id: impl Into<OptionId>,
        text: impl Into<String>,
        is_correct: bool,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_correct,
            explanation: explanation.into(),
        }
    }
}

/// A single multiple-choice question.
///
/// Nothing here forces exactly one correct option; the lesson builder checks
/// that when questions are entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub lesson_id: LessonId,
    pub question_type: QuestionType,
    pub reference: Option<String>,
    pub question_text: String,
    pub sequence_number: u32,
    pub options: Vec<QuizOption>,
}

impl Quiz {
    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&QuizOption> {
        self.options.iter().find(|o| &o.id == id)
    }

    /// First option flagged correct, if any.
    #[must_use]
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadershipNote {
    pub title: String,
    /// Markup body; rendering and sanitising are the presentation layer's job.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub description: String,
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub lesson_type: LessonType,
    pub leadership_note: LeadershipNote,
    pub created_at: DateTime<Utc>,
    pub bible_quizzes: Vec<Quiz>,
    pub note_quizzes: Vec<Quiz>,
}

impl Lesson {
    /// Questions of one set, in sequence order as stored.
    #[must_use]
    pub fn quizzes(&self, set: QuestionType) -> &[Quiz] {
        match set {
            QuestionType::BibleQuiz => &self.bible_quizzes,
            QuestionType::NoteQuiz => &self.note_quizzes,
        }
    }

    /// Bible questions followed by note questions.
    pub fn all_quizzes(&self) -> impl Iterator<Item = &Quiz> {
        self.bible_quizzes.iter().chain(self.note_quizzes.iter())
    }

    #[must_use]
    pub fn find_quiz(&self, id: &QuizId) -> Option<&Quiz> {
        self.all_quizzes().find(|q| &q.id == id)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.bible_quizzes.len() + self.note_quizzes.len()
    }

    /// Quizzes whose `lesson_id` does not point back at this lesson.
    #[must_use]
    pub fn foreign_quizzes(&self) -> Vec<&QuizId> {
        self.all_quizzes()
            .filter(|q| q.lesson_id != self.id)
            .map(|q| &q.id)
            .collect()
    }

    /// `"Genesis 1"`-style heading, when a book is set.
    #[must_use]
    pub fn reference_label(&self) -> Option<String> {
        let book = self.book.as_deref()?;
        Some(match self.chapter {
            Some(chapter) => format!("{book} {chapter}"),
            None => book.to_owned(),
        })
    }

    /// Returns a copy under a new id and title, re-pointing every quiz at it.
    #[must_use]
    pub fn relabelled(&self, id: LessonId, title: impl Into<String>) -> Self {
        let mut lesson = self.clone();
        for quiz in lesson
            .bible_quizzes
            .iter_mut()
            .chain(lesson.note_quizzes.iter_mut())
        {
            quiz.lesson_id = id.clone();
        }
        lesson.id = id;
        lesson.title = title.into();
        lesson
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn quiz(id: &str, lesson: &str, set: QuestionType, correct: &str) -> Quiz {
        Quiz {
            id: QuizId::new(id),
            lesson_id: LessonId::new(lesson),
            question_type: set,
            reference: None,
            question_text: format!("{id}?"),
            sequence_number: 1,
            options: ["A", "B"]
                .iter()
                .map(|label| QuizOption::new(*label, *label, *label == correct, ""))
                .collect(),
        }
    }

    fn lesson() -> Lesson {
        Lesson {
            id: LessonId::new("L1"),
            title: "Lesson".into(),
            description: String::new(),
            book: Some("Genesis".into()),
            chapter: Some(1),
            lesson_type: LessonType::Mixed,
            leadership_note: LeadershipNote {
                title: "Note".into(),
                body: "<p>Body</p>".into(),
            },
            created_at: fixed_now(),
            bible_quizzes: vec![quiz("B1", "L1", QuestionType::BibleQuiz, "A")],
            note_quizzes: vec![quiz("N1", "L1", QuestionType::NoteQuiz, "B")],
        }
    }

    #[test]
    fn finds_quiz_across_sets() {
        let lesson = lesson();
        assert!(lesson.find_quiz(&QuizId::new("N1")).is_some());
        assert!(lesson.find_quiz(&QuizId::new("missing")).is_none());
        assert_eq!(lesson.question_count(), 2);
    }

    #[test]
    fn correct_option_is_first_flagged() {
        let lesson = lesson();
        let q = &lesson.note_quizzes[0];
        assert_eq!(q.correct_option().unwrap().id, OptionId::new("B"));
        assert!(q.option(&OptionId::new("C")).is_none());
    }

    #[test]
    fn relabelled_repoints_quizzes() {
        let mut original = lesson();
        original.note_quizzes[0].lesson_id = LessonId::new("OTHER");
        assert_eq!(original.foreign_quizzes(), vec![&QuizId::new("N1")]);

        let copy = original.relabelled(LessonId::new("L2"), "Copy");
        assert_eq!(copy.id, LessonId::new("L2"));
        assert_eq!(copy.title, "Copy");
        assert!(copy.foreign_quizzes().is_empty());
    }

    #[test]
    fn reference_label_formats_book_and_chapter() {
        let mut lesson = lesson();
        assert_eq!(lesson.reference_label().as_deref(), Some("Genesis 1"));
        lesson.chapter = None;
        assert_eq!(lesson.reference_label().as_deref(), Some("Genesis"));
        lesson.book = None;
        assert_eq!(lesson.reference_label(), None);
    }

    #[test]
    fn question_type_uses_display_names_on_the_wire() {
        let json = serde_json::to_string(&QuestionType::NoteQuiz).unwrap();
        assert_eq!(json, "\"Note Quiz\"");
        assert_eq!(QuestionType::parse("Bible Quiz"), Some(QuestionType::BibleQuiz));
    }
}
