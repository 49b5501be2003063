use chrono::{DateTime, Utc};
use lms_core::model::{
    Attempt, AttemptId, LeadershipNote, Lesson, LessonId, LessonType, OptionId, QuestionType,
    Quiz, QuizId, QuizOption, Role, User, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_to_i64(v: u32) -> i64 {
    i64::from(v)
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range: {v}")))
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn options_to_json(options: &[QuizOption]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let role_str: String = row.try_get("role").map_err(ser)?;
    let role: Role = role_str.parse().map_err(ser)?;
    Ok(User {
        id: UserId::new(row.try_get::<String, _>("id").map_err(ser)?),
        name: row.try_get("name").map_err(ser)?,
        email: row.try_get("email").map_err(ser)?,
        role,
        avatar_url: row.try_get("avatar_url").map_err(ser)?,
    })
}

/// Maps a `lessons` row; quizzes are attached by the caller.
pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let lesson_type_str: String = row.try_get("lesson_type").map_err(ser)?;
    let lesson_type = LessonType::parse(&lesson_type_str).ok_or_else(|| {
        StorageError::Serialization(format!("invalid lesson_type: {lesson_type_str}"))
    })?;
    let chapter = row
        .try_get::<Option<i64>, _>("chapter")
        .map_err(ser)?
        .map(|c| i64_to_u32("chapter", c))
        .transpose()?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;

    Ok(Lesson {
        id: LessonId::new(row.try_get::<String, _>("id").map_err(ser)?),
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        book: row.try_get("book").map_err(ser)?,
        chapter,
        lesson_type,
        leadership_note: LeadershipNote {
            title: row.try_get("note_title").map_err(ser)?,
            body: row.try_get("note_body").map_err(ser)?,
        },
        created_at,
        bible_quizzes: Vec::new(),
        note_quizzes: Vec::new(),
    })
}

pub(crate) fn set_to_str(set: QuestionType) -> &'static str {
    match set {
        QuestionType::BibleQuiz => "bible",
        QuestionType::NoteQuiz => "note",
    }
}

fn parse_set(s: &str) -> Result<QuestionType, StorageError> {
    match s {
        "bible" => Ok(QuestionType::BibleQuiz),
        "note" => Ok(QuestionType::NoteQuiz),
        _ => Err(StorageError::Serialization(format!("invalid question_set: {s}"))),
    }
}

/// Maps a `quizzes` row to its owning lesson id, the set it is listed in, and the quiz.
///
/// The set is stored apart from `question_type` so a mislabelled quiz still
/// comes back in the list it was saved in.
pub(crate) fn map_quiz_row(
    row: &SqliteRow,
) -> Result<(LessonId, QuestionType, Quiz), StorageError> {
    let set_str: String = row.try_get("question_set").map_err(ser)?;
    let set = parse_set(&set_str)?;
    let type_str: String = row.try_get("question_type").map_err(ser)?;
    let question_type = QuestionType::parse(&type_str)
        .ok_or_else(|| StorageError::Serialization(format!("invalid question_type: {type_str}")))?;
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<QuizOption> = serde_json::from_str(&options_json).map_err(ser)?;

    let owner = LessonId::new(row.try_get::<String, _>("owner_id").map_err(ser)?);
    let quiz = Quiz {
        id: QuizId::new(row.try_get::<String, _>("id").map_err(ser)?),
        lesson_id: LessonId::new(row.try_get::<String, _>("lesson_id").map_err(ser)?),
        question_type,
        reference: row.try_get("reference").map_err(ser)?,
        question_text: row.try_get("question_text").map_err(ser)?,
        sequence_number: i64_to_u32(
            "sequence_number",
            row.try_get::<i64, _>("sequence_number").map_err(ser)?,
        )?,
        options,
    };
    Ok((owner, set, quiz))
}

pub(crate) fn attach_quiz(lesson: &mut Lesson, set: QuestionType, quiz: Quiz) {
    match set {
        QuestionType::BibleQuiz => lesson.bible_quizzes.push(quiz),
        QuestionType::NoteQuiz => lesson.note_quizzes.push(quiz),
    }
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<Attempt, StorageError> {
    let id_str: String = row.try_get("id").map_err(ser)?;
    let id: AttemptId = id_str.parse().map_err(ser)?;
    Ok(Attempt {
        id,
        student_id: UserId::new(row.try_get::<String, _>("student_id").map_err(ser)?),
        lesson_id: LessonId::new(row.try_get::<String, _>("lesson_id").map_err(ser)?),
        quiz_id: QuizId::new(row.try_get::<String, _>("quiz_id").map_err(ser)?),
        selected_option_id: OptionId::new(
            row.try_get::<String, _>("selected_option_id")
                .map_err(ser)?,
        ),
        is_correct: row.try_get::<i64, _>("is_correct").map_err(ser)? != 0,
        timestamp: row.try_get("attempted_at").map_err(ser)?,
    })
}
