use lms_core::model::{Attempt, LessonId, UserId};

use super::SqliteRepository;
use super::mapping::map_attempt_row;
use crate::repository::{AttemptRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
            INSERT INTO attempts (
                id, student_id, lesson_id, quiz_id, selected_option_id,
                is_correct, attempted_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(attempt.id.to_string())
        .bind(attempt.student_id.as_str())
        .bind(attempt.lesson_id.as_str())
        .bind(attempt.quiz_id.as_str())
        .bind(attempt.selected_option_id.as_str())
        .bind(i64::from(attempt.is_correct))
        .bind(attempt.timestamp)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StorageError::Conflict)
            }
            Err(e) => Err(conn(e)),
        }
    }

    async fn attempts_for(
        &self,
        student_id: &UserId,
        lesson_id: &LessonId,
    ) -> Result<Vec<Attempt>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, student_id, lesson_id, quiz_id, selected_option_id,
                   is_correct, attempted_at
            FROM attempts
            WHERE student_id = ?1 AND lesson_id = ?2
            ORDER BY seq ASC
            ",
        )
        .bind(student_id.as_str())
        .bind(lesson_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }

    async fn attempts_for_lesson(&self, lesson_id: &LessonId) -> Result<Vec<Attempt>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, student_id, lesson_id, quiz_id, selected_option_id,
                   is_correct, attempted_at
            FROM attempts
            WHERE lesson_id = ?1
            ORDER BY seq ASC
            ",
        )
        .bind(lesson_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}
