use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates users, lessons, quizzes, and the attempt log.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS users (
                    position INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    role TEXT NOT NULL CHECK (role IN ('admin', 'mentor', 'student', 'parent')),
                    avatar_url TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // `position` keeps first-insert order when a lesson is replaced.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS lessons (
                    position INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    book TEXT,
                    chapter INTEGER CHECK (chapter IS NULL OR chapter >= 0),
                    lesson_type TEXT NOT NULL,
                    note_title TEXT NOT NULL,
                    note_body TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quizzes (
                    owner_id TEXT NOT NULL,
                    question_set TEXT NOT NULL CHECK (question_set IN ('bible', 'note')),
                    position INTEGER NOT NULL CHECK (position >= 0),
                    id TEXT NOT NULL,
                    lesson_id TEXT NOT NULL,
                    question_type TEXT NOT NULL,
                    reference TEXT,
                    question_text TEXT NOT NULL,
                    sequence_number INTEGER NOT NULL CHECK (sequence_number >= 0),
                    options TEXT NOT NULL,
                    PRIMARY KEY (owner_id, question_set, position),
                    FOREIGN KEY (owner_id) REFERENCES lessons(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // No foreign keys: the log outlives lesson replacement.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS attempts (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    student_id TEXT NOT NULL,
                    lesson_id TEXT NOT NULL,
                    quiz_id TEXT NOT NULL,
                    selected_option_id TEXT NOT NULL,
                    is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
                    attempted_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_attempts_student_lesson_seq
                    ON attempts (student_id, lesson_id, seq);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_attempts_lesson_seq
                    ON attempts (lesson_id, seq);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(version = 1, "applied sqlite migration");
    }

    Ok(())
}
