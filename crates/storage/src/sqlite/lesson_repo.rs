use std::collections::HashMap;

use lms_core::model::{Lesson, LessonId, QuestionType, Quiz};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use super::SqliteRepository;
use super::mapping::{
    attach_quiz, map_lesson_row, map_quiz_row, options_to_json, set_to_str, u32_to_i64,
    usize_to_i64,
};
use crate::repository::{LessonRepository, SaveOutcome, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

const LESSON_COLUMNS: &str = "id, title, description, book, chapter, lesson_type, note_title, note_body, created_at";

const QUIZ_COLUMNS: &str =
    "owner_id, question_set, id, lesson_id, question_type, reference, question_text, sequence_number, options";

async fn insert_quiz(
    tx: &mut Transaction<'_, Sqlite>,
    owner: &LessonId,
    set: QuestionType,
    position: usize,
    quiz: &Quiz,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO quizzes (
            owner_id, question_set, position, id, lesson_id, question_type,
            reference, question_text, sequence_number, options
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ",
    )
    .bind(owner.as_str())
    .bind(set_to_str(set))
    .bind(usize_to_i64("position", position)?)
    .bind(quiz.id.as_str())
    .bind(quiz.lesson_id.as_str())
    .bind(quiz.question_type.as_str())
    .bind(quiz.reference.as_deref())
    .bind(&quiz.question_text)
    .bind(u32_to_i64(quiz.sequence_number))
    .bind(options_to_json(&quiz.options)?)
    .execute(&mut **tx)
    .await
    .map_err(conn)?;
    Ok(())
}

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let lesson_rows = sqlx::query(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons ORDER BY position ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let quiz_rows = sqlx::query(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY owner_id, question_set, position"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut by_owner: HashMap<LessonId, Vec<(QuestionType, Quiz)>> = HashMap::new();
        for row in &quiz_rows {
            let (owner, set, quiz) = map_quiz_row(row)?;
            by_owner.entry(owner).or_default().push((set, quiz));
        }

        let mut lessons = Vec::with_capacity(lesson_rows.len());
        for row in &lesson_rows {
            let mut lesson = map_lesson_row(row)?;
            for (set, quiz) in by_owner.remove(&lesson.id).unwrap_or_default() {
                attach_quiz(&mut lesson, set, quiz);
            }
            lessons.push(lesson);
        }
        debug!(count = lessons.len(), "listed lessons");
        Ok(lessons)
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut lesson = map_lesson_row(&row)?;

        let quiz_rows = sqlx::query(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE owner_id = ?1 ORDER BY question_set, position"
        ))
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        for row in &quiz_rows {
            let (_, set, quiz) = map_quiz_row(row)?;
            attach_quiz(&mut lesson, set, quiz);
        }
        Ok(Some(lesson))
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<SaveOutcome, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let existed = sqlx::query("SELECT 1 FROM lessons WHERE id = ?1")
            .bind(lesson.id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?
            .is_some();

        sqlx::query(
            r"
            INSERT INTO lessons (
                id, title, description, book, chapter, lesson_type,
                note_title, note_body, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                book = excluded.book,
                chapter = excluded.chapter,
                lesson_type = excluded.lesson_type,
                note_title = excluded.note_title,
                note_body = excluded.note_body,
                created_at = excluded.created_at
            ",
        )
        .bind(lesson.id.as_str())
        .bind(&lesson.title)
        .bind(&lesson.description)
        .bind(lesson.book.as_deref())
        .bind(lesson.chapter.map(u32_to_i64))
        .bind(lesson.lesson_type.as_str())
        .bind(&lesson.leadership_note.title)
        .bind(&lesson.leadership_note.body)
        .bind(lesson.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // Replacement is wholesale: drop the old question sets first.
        sqlx::query("DELETE FROM quizzes WHERE owner_id = ?1")
            .bind(lesson.id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, quiz) in lesson.bible_quizzes.iter().enumerate() {
            insert_quiz(&mut tx, &lesson.id, QuestionType::BibleQuiz, position, quiz).await?;
        }
        for (position, quiz) in lesson.note_quizzes.iter().enumerate() {
            insert_quiz(&mut tx, &lesson.id, QuestionType::NoteQuiz, position, quiz).await?;
        }

        tx.commit().await.map_err(conn)?;

        let outcome = if existed {
            SaveOutcome::Replaced
        } else {
            SaveOutcome::Inserted
        };
        debug!(lesson = %lesson.id, ?outcome, "stored lesson");
        Ok(outcome)
    }
}
