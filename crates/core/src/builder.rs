use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    LeadershipNote, Lesson, LessonId, LessonType, OptionId, QuestionType, Quiz, QuizId, QuizOption,
};

/// Fewest options a question may have.
pub const MIN_OPTIONS: usize = 2;
/// Most options a question may have (labels run `A`..=`Z`).
pub const MAX_OPTIONS: usize = 26;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    #[error("lesson id cannot be empty")]
    EmptyLessonId,

    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("leadership note title cannot be empty")]
    EmptyNoteTitle,

    #[error("question text cannot be empty")]
    EmptyQuestionText,

    #[error("a question needs between 2 and 26 options, got {0}")]
    OptionCount(usize),

    #[error("option {0} has no text")]
    EmptyOptionText(OptionId),

    #[error("no option is marked correct")]
    NoCorrectOption,

    #[error("more than one option is marked correct")]
    MultipleCorrectOptions,

    #[error("{set} question {number}: {source}")]
    Question {
        set: QuestionType,
        number: usize,
        #[source]
        source: Box<BuildError>,
    },
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionDraft {
    pub text: String,
    pub is_correct: bool,
    pub explanation: String,
}

impl OptionDraft {
    #[must_use]
    pub fn new(text: impl Into<String>, is_correct: bool, explanation: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_correct,
            explanation: explanation.into(),
        }
    }
}

/// One question as typed into the builder, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub reference: Option<String>,
    pub question_text: String,
    pub options: Vec<OptionDraft>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(question_text: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn option(mut self, option: OptionDraft) -> Self {
        self.options.push(option);
        self
    }

    /// Checks text, option count, option text, and that exactly one option is correct.
    ///
    /// # Errors
    ///
    /// Returns the first `BuildError` found.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.question_text.trim().is_empty() {
            return Err(BuildError::EmptyQuestionText);
        }
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&self.options.len()) {
            return Err(BuildError::OptionCount(self.options.len()));
        }
        for (i, option) in self.options.iter().enumerate() {
            if option.text.trim().is_empty() {
                let label = OptionId::from_index(i).unwrap_or_else(|| OptionId::new("?"));
                return Err(BuildError::EmptyOptionText(label));
            }
        }
        match self.options.iter().filter(|o| o.is_correct).count() {
            0 => Err(BuildError::NoCorrectOption),
            1 => Ok(()),
            _ => Err(BuildError::MultipleCorrectOptions),
        }
    }
}

/// Lesson metadata, note, and questions collected step by step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub id: String,
    pub title: String,
    pub description: String,
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub lesson_type: LessonType,
    pub note_title: String,
    pub note_body: String,
    bible: Vec<QuestionDraft>,
    note: Vec<QuestionDraft>,
}

impl LessonDraft {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            book: None,
            chapter: None,
            lesson_type: LessonType::Mixed,
            note_title: String::new(),
            note_body: String::new(),
            bible: Vec::new(),
            note: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn scripture(mut self, book: impl Into<String>, chapter: Option<u32>) -> Self {
        self.book = Some(book.into());
        self.chapter = chapter;
        self
    }

    #[must_use]
    pub fn lesson_type(mut self, lesson_type: LessonType) -> Self {
        self.lesson_type = lesson_type;
        self
    }

    #[must_use]
    pub fn note(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.note_title = title.into();
        self.note_body = body.into();
        self
    }

    /// Validates and appends one question to the given set.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` if the question is invalid; the draft is left unchanged.
    pub fn add_question(
        &mut self,
        set: QuestionType,
        question: QuestionDraft,
    ) -> Result<(), BuildError> {
        question.validate()?;
        self.questions_mut(set).push(question);
        Ok(())
    }

    /// Removes and returns the question at `index` in the given set.
    pub fn remove_question(&mut self, set: QuestionType, index: usize) -> Option<QuestionDraft> {
        let questions = self.questions_mut(set);
        (index < questions.len()).then(|| questions.remove(index))
    }

    #[must_use]
    pub fn questions(&self, set: QuestionType) -> &[QuestionDraft] {
        match set {
            QuestionType::BibleQuiz => &self.bible,
            QuestionType::NoteQuiz => &self.note,
        }
    }

    fn questions_mut(&mut self, set: QuestionType) -> &mut Vec<QuestionDraft> {
        match set {
            QuestionType::BibleQuiz => &mut self.bible,
            QuestionType::NoteQuiz => &mut self.note,
        }
    }

    /// Assembles the lesson, assigning quiz ids, sequence numbers, and option labels.
    ///
    /// Quiz ids are `<lesson>-B<n>` for bible questions and `<lesson>-N<n>` for
    /// note questions, numbered from 1.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` for missing metadata or any invalid question.
    pub fn build(self, created_at: DateTime<Utc>) -> Result<Lesson, BuildError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(BuildError::EmptyLessonId);
        }
        if self.title.trim().is_empty() {
            return Err(BuildError::EmptyTitle);
        }
        if self.note_title.trim().is_empty() {
            return Err(BuildError::EmptyNoteTitle);
        }

        let lesson_id = LessonId::new(id);
        let bible_quizzes = assemble(&lesson_id, QuestionType::BibleQuiz, self.bible)?;
        let note_quizzes = assemble(&lesson_id, QuestionType::NoteQuiz, self.note)?;

        Ok(Lesson {
            id: lesson_id,
            title: self.title.trim().to_owned(),
            description: self.description,
            book: self.book.filter(|b| !b.trim().is_empty()),
            chapter: self.chapter,
            lesson_type: self.lesson_type,
            leadership_note: LeadershipNote {
                title: self.note_title.trim().to_owned(),
                body: self.note_body,
            },
            created_at,
            bible_quizzes,
            note_quizzes,
        })
    }
}

fn assemble(
    lesson_id: &LessonId,
    set: QuestionType,
    drafts: Vec<QuestionDraft>,
) -> Result<Vec<Quiz>, BuildError> {
    let prefix = match set {
        QuestionType::BibleQuiz => 'B',
        QuestionType::NoteQuiz => 'N',
    };
    let mut quizzes = Vec::with_capacity(drafts.len());
    for (i, draft) in drafts.into_iter().enumerate() {
        let number = i + 1;
        draft.validate().map_err(|e| BuildError::Question {
            set,
            number,
            source: Box::new(e),
        })?;

        let mut options = Vec::with_capacity(draft.options.len());
        for (j, option) in draft.options.into_iter().enumerate() {
            let label = OptionId::from_index(j).ok_or(BuildError::OptionCount(j + 1))?;
            options.push(QuizOption {
                id: label,
                text: option.text.trim().to_owned(),
                is_correct: option.is_correct,
                explanation: option.explanation,
            });
        }

        quizzes.push(Quiz {
            id: QuizId::new(format!("{lesson_id}-{prefix}{number}")),
            lesson_id: lesson_id.clone(),
            question_type: set,
            reference: draft.reference.filter(|r| !r.trim().is_empty()),
            question_text: draft.question_text.trim().to_owned(),
            sequence_number: u32::try_from(number).unwrap_or(u32::MAX),
            options,
        });
    }
    Ok(quizzes)
}
