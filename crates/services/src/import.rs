//! Three-step lesson import: upload, preview, complete.
//!
//! Package parsing is simulated. Whatever file is offered, the preview is the
//! bundled Genesis lesson relabelled as the next imported lesson.

use std::fmt;
use std::sync::Arc;

use lms_core::model::{Lesson, LessonId};
use serde::Serialize;
use storage::seed::genesis_lesson;
use tracing::info;

use crate::Clock;
use crate::error::ImportError;
use crate::lesson_service::LessonService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportStep {
    Upload,
    Preview,
    Complete,
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportStep::Upload => "upload",
            ImportStep::Preview => "preview",
            ImportStep::Complete => "complete",
        })
    }
}

/// What the preview step shows before the lesson is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportPreview {
    pub source: String,
    pub lesson_id: LessonId,
    pub title: String,
    pub note_title: String,
    pub note_excerpt: String,
    pub bible_questions: usize,
    pub note_questions: usize,
}

impl ImportPreview {
    #[must_use]
    pub fn from_lesson(source: impl Into<String>, lesson: &Lesson) -> Self {
        Self {
            source: source.into(),
            lesson_id: lesson.id.clone(),
            title: lesson.title.clone(),
            note_title: lesson.leadership_note.title.clone(),
            note_excerpt: strip_markup(&lesson.leadership_note.body),
            bible_questions: lesson.bible_quizzes.len(),
            note_questions: lesson.note_quizzes.len(),
        }
    }
}

/// Removes `<...>` tags and collapses the remaining whitespace.
///
/// An unterminated tag swallows the rest of the input.
#[must_use]
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct ImportWizard {
    clock: Clock,
    lessons: Arc<LessonService>,
    step: ImportStep,
    pending: Option<(String, Lesson)>,
}

impl ImportWizard {
    #[must_use]
    pub fn new(clock: Clock, lessons: Arc<LessonService>) -> Self {
        Self {
            clock,
            lessons,
            step: ImportStep::Upload,
            pending: None,
        }
    }

    #[must_use]
    pub fn step(&self) -> ImportStep {
        self.step
    }

    /// Parse an uploaded package and move to the preview step.
    ///
    /// The next lesson is numbered from the current lesson count, so the
    /// first import into the seeded store becomes `GENESIS-CH2`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::WrongStep` unless the wizard is at upload.
    /// Returns `ImportError::Lesson` if the lesson count cannot be read.
    pub async fn upload(&mut self, source: &str) -> Result<ImportPreview, ImportError> {
        self.expect_step(ImportStep::Upload)?;
        let next = self.lessons.lesson_count().await? + 1;
        let lesson = genesis_lesson(self.clock.now()).relabelled(
            LessonId::new(format!("GENESIS-CH{next}")),
            format!("Imported Lesson {next}"),
        );
        let preview = ImportPreview::from_lesson(source, &lesson);
        info!(source, lesson = %lesson.id, "parsed lesson package");
        self.pending = Some((source.to_owned(), lesson));
        self.step = ImportStep::Preview;
        Ok(preview)
    }

    /// The pending preview, if the wizard is at the preview step.
    #[must_use]
    pub fn preview(&self) -> Option<ImportPreview> {
        self.pending
            .as_ref()
            .map(|(source, lesson)| ImportPreview::from_lesson(source.as_str(), lesson))
    }

    /// Drop the pending lesson and go back to upload.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.step = ImportStep::Upload;
    }

    /// Save the previewed lesson and move to the complete step.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::WrongStep` unless the wizard is at preview.
    /// Returns `ImportError::Lesson` if the lesson cannot be saved.
    pub async fn commit(&mut self) -> Result<Lesson, ImportError> {
        self.expect_step(ImportStep::Preview)?;
        let Some((source, lesson)) = self.pending.take() else {
            return Err(ImportError::WrongStep {
                expected: ImportStep::Preview,
                actual: ImportStep::Upload,
            });
        };
        if let Err(err) = self.lessons.save_lesson(&lesson).await {
            self.pending = Some((source, lesson));
            return Err(err.into());
        }
        info!(source = %source, lesson = %lesson.id, "imported lesson");
        self.step = ImportStep::Complete;
        Ok(lesson)
    }

    /// Start over after a completed import.
    pub fn restart(&mut self) {
        self.cancel();
    }

    fn expect_step(&self, expected: ImportStep) -> Result<(), ImportError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(ImportError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    async fn wizard_with_seed() -> (ImportWizard, Arc<LessonService>) {
        let lessons = Arc::new(LessonService::new(
            fixed_clock(),
            Arc::new(InMemoryRepository::new()),
        ));
        lessons.save_lesson(&genesis_lesson(fixed_now())).await.unwrap();
        (ImportWizard::new(fixed_clock(), Arc::clone(&lessons)), lessons)
    }

    #[test]
    fn strip_markup_drops_tags() {
        assert_eq!(
            strip_markup("<h2>Order</h2>\n<p>From <em>chaos</em>.</p>"),
            "Order From chaos ."
        );
        assert_eq!(strip_markup("plain text"), "plain text");
        assert_eq!(strip_markup("cut <p off"), "cut");
    }

    #[tokio::test]
    async fn upload_previews_next_numbered_lesson() {
        let (mut wizard, _) = wizard_with_seed().await;
        let preview = wizard.upload("genesis.xlsx").await.unwrap();

        assert_eq!(wizard.step(), ImportStep::Preview);
        assert_eq!(preview.lesson_id.as_str(), "GENESIS-CH2");
        assert_eq!(preview.title, "Imported Lesson 2");
        assert_eq!(preview.bible_questions, 2);
        assert_eq!(preview.note_questions, 1);
        assert!(!preview.note_excerpt.contains('<'));
        assert_eq!(wizard.preview(), Some(preview));
    }

    #[tokio::test]
    async fn cancel_returns_to_upload_without_saving() {
        let (mut wizard, lessons) = wizard_with_seed().await;
        wizard.upload("genesis.xlsx").await.unwrap();
        wizard.cancel();

        assert_eq!(wizard.step(), ImportStep::Upload);
        assert!(wizard.preview().is_none());
        assert_eq!(lessons.lesson_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn commit_saves_a_consistent_lesson() {
        let (mut wizard, lessons) = wizard_with_seed().await;
        wizard.upload("genesis.xlsx").await.unwrap();
        let lesson = wizard.commit().await.unwrap();

        assert_eq!(wizard.step(), ImportStep::Complete);
        assert!(lesson.foreign_quizzes().is_empty());
        let all = lessons.list_lessons().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1], lesson);

        wizard.restart();
        let next = wizard.upload("again.csv").await.unwrap();
        assert_eq!(next.lesson_id.as_str(), "GENESIS-CH3");
    }

    #[tokio::test]
    async fn steps_are_enforced() {
        let (mut wizard, _) = wizard_with_seed().await;
        let err = wizard.commit().await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::WrongStep {
                expected: ImportStep::Preview,
                actual: ImportStep::Upload
            }
        ));

        wizard.upload("a.xlsx").await.unwrap();
        assert!(matches!(
            wizard.upload("b.xlsx").await,
            Err(ImportError::WrongStep { .. })
        ));
    }
}
