use std::error::Error;
use std::fmt;
use std::io::Write;

use lms_core::model::{Lesson, LessonId, QuestionType, Quiz, Role, User};
use services::import::strip_markup;
use services::{AppServices, Dashboard, LessonView, Session};

use crate::args::Command;

const DEFAULT_IMPORT_SOURCE: &str = "lesson-template.xlsx";

#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    Denied { role: Role, action: &'static str },
    UnknownLesson(LessonId),
    NoUserForRole(Role),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Denied { role, action } => write!(f, "a {role} cannot {action}"),
            CommandError::UnknownLesson(id) => write!(f, "no lesson with id {id}"),
            CommandError::NoUserForRole(role) => write!(f, "no user has the {role} role"),
        }
    }
}

impl Error for CommandError {}

/// Start a session and switch it to `role`.
///
/// # Errors
///
/// Returns `CommandError::NoUserForRole` if nobody in the directory has `role`.
pub async fn open_session(app: &AppServices, role: Role) -> Result<Session, Box<dyn Error>> {
    let mut session = app.session().await?;
    if session.current().role != role && session.switch_role(role).is_none() {
        return Err(CommandError::NoUserForRole(role).into());
    }
    Ok(session)
}

fn require_manager(user: &User, action: &'static str) -> Result<(), CommandError> {
    if user.role.can_manage_curriculum() {
        Ok(())
    } else {
        Err(CommandError::Denied {
            role: user.role,
            action,
        })
    }
}

async fn load_lesson(app: &AppServices, id: &LessonId) -> Result<Lesson, Box<dyn Error>> {
    app.lessons()
        .get_lesson(id)
        .await?
        .ok_or_else(|| CommandError::UnknownLesson(id.clone()).into())
}

/// Run one command as the session's current user, writing the result to `out`.
///
/// # Errors
///
/// Returns the first service, permission, or output error.
pub async fn execute(
    app: &AppServices,
    session: &Session,
    command: &Command,
    json: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let user = session.current();
    match command {
        Command::Help => {}
        Command::Users => {
            for u in session.users() {
                let marker = if u.id == user.id { '*' } else { ' ' };
                writeln!(out, "{marker} {:<10} {:<14} {:<8} {}", u.id, u.name, u.role, u.email)?;
            }
        }
        Command::Lessons => {
            for lesson in app.lessons().list_lessons().await? {
                writeln!(
                    out,
                    "{:<14} {}  [{}]  {} bible / {} note questions",
                    lesson.id,
                    lesson.title,
                    lesson.reference_label().unwrap_or_else(|| "-".into()),
                    lesson.bible_quizzes.len(),
                    lesson.note_quizzes.len(),
                )?;
            }
        }
        Command::Show { lesson } => {
            let lesson = load_lesson(app, lesson).await?;
            let view = if user.role.can_take_quizzes() {
                Some(LessonView::open(&app.attempts(), user.clone(), lesson.clone()).await?)
            } else {
                None
            };
            write_lesson(out, &lesson, view.as_ref(), user.role.can_manage_curriculum())?;
        }
        Command::Answer {
            lesson,
            quiz,
            option,
        } => {
            let attempt = app.attempts().answer(user, lesson, quiz, option).await?;
            let lesson = load_lesson(app, lesson).await?;
            let explanation = lesson
                .find_quiz(quiz)
                .and_then(|q| q.option(option))
                .map(|o| o.explanation.clone())
                .unwrap_or_default();
            let verdict = if attempt.is_correct { "Correct" } else { "Incorrect" };
            writeln!(out, "{verdict}. {explanation}")?;
            let progress = app.attempts().progress_in(&user.id, &lesson).await?;
            writeln!(out, "{}% of {} complete", progress.percent_complete(), lesson.id)?;
        }
        Command::Progress { lesson } => {
            let lesson = load_lesson(app, lesson).await?;
            let progress = app.attempts().progress_in(&user.id, &lesson).await?;
            for set in [QuestionType::BibleQuiz, QuestionType::NoteQuiz] {
                let p = progress.for_set(set);
                writeln!(
                    out,
                    "{set}: {}/{} attempted, {} correct",
                    p.attempted, p.total, p.correct
                )?;
            }
            writeln!(out, "Overall: {}% complete", progress.percent_complete())?;
        }
        Command::Stats { lesson } => {
            let lesson = load_lesson(app, lesson).await?;
            let stats = app.attempts().lesson_stats(&lesson).await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
            } else {
                writeln!(out, "Total attempts:  {}", stats.total_attempts)?;
                writeln!(out, "Average score:   {}%", stats.avg_score)?;
                writeln!(out, "Completion rate: {}%", stats.completion_rate)?;
            }
        }
        Command::Dashboard => {
            let dashboard = app.dashboard().for_user(user).await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&dashboard)?)?;
            } else {
                write_dashboard(out, &dashboard)?;
            }
        }
        Command::Import { source } => {
            require_manager(user, "import lessons")?;
            let mut wizard = app.import_wizard();
            let preview = wizard
                .upload(source.as_deref().unwrap_or(DEFAULT_IMPORT_SOURCE))
                .await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&preview)?)?;
            } else {
                writeln!(out, "Preview of {}", preview.source)?;
                writeln!(out, "  {} ({})", preview.title, preview.lesson_id)?;
                writeln!(out, "  Leadership note: {}", preview.note_title)?;
                writeln!(
                    out,
                    "  {} bible / {} note questions",
                    preview.bible_questions, preview.note_questions
                )?;
            }
            let lesson = wizard.commit().await?;
            if !json {
                writeln!(out, "Imported {}", lesson.id)?;
            }
        }
    }
    Ok(())
}

fn write_lesson(
    out: &mut impl Write,
    lesson: &Lesson,
    view: Option<&LessonView>,
    show_key: bool,
) -> std::io::Result<()> {
    writeln!(out, "{} ({})", lesson.title, lesson.id)?;
    if let Some(reference) = lesson.reference_label() {
        writeln!(out, "{reference} | {}", lesson.lesson_type)?;
    }
    if !lesson.description.is_empty() {
        writeln!(out, "{}", lesson.description)?;
    }
    writeln!(out)?;
    writeln!(out, "Leadership note: {}", lesson.leadership_note.title)?;
    writeln!(out, "{}", strip_markup(&lesson.leadership_note.body))?;

    for set in [QuestionType::BibleQuiz, QuestionType::NoteQuiz] {
        let quizzes = lesson.quizzes(set);
        if quizzes.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{set}")?;
        for quiz in quizzes {
            write_quiz(out, quiz, view, show_key)?;
        }
    }

    if let Some(view) = view {
        writeln!(out)?;
        writeln!(out, "{}% complete", view.progress().percent_complete())?;
    }
    Ok(())
}

fn write_quiz(
    out: &mut impl Write,
    quiz: &Quiz,
    view: Option<&LessonView>,
    show_key: bool,
) -> std::io::Result<()> {
    let reference = quiz
        .reference
        .as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default();
    writeln!(out, "  {}. [{}]{reference} {}", quiz.sequence_number, quiz.id, quiz.question_text)?;
    let previous = view.and_then(|v| v.previous_answer(&quiz.id));
    for option in &quiz.options {
        let picked = previous.is_some_and(|p| p.option_id == option.id);
        let marker = match (picked, show_key && option.is_correct) {
            (true, _) if option.is_correct => "✓",
            (true, _) => "✗",
            (false, true) => "*",
            (false, false) => " ",
        };
        writeln!(out, "    {marker} {}. {}", option.id, option.text)?;
    }
    Ok(())
}

fn write_dashboard(out: &mut impl Write, dashboard: &Dashboard) -> std::io::Result<()> {
    match dashboard {
        Dashboard::Student {
            first_name,
            recent,
            lessons_completed,
            average_score,
        } => {
            writeln!(out, "Welcome back, {first_name}")?;
            writeln!(out, "Lessons completed: {lessons_completed}")?;
            writeln!(out, "Average quiz score: {average_score}%")?;
            writeln!(out)?;
            writeln!(out, "Recent studies")?;
            for card in recent {
                writeln!(
                    out,
                    "  {:<14} {:>3}%  {}",
                    card.lesson_id, card.percent_complete, card.title
                )?;
            }
        }
        Dashboard::Staff {
            first_name,
            lesson_count,
            lessons,
            can_manage,
        } => {
            writeln!(out, "Welcome back, {first_name}")?;
            writeln!(out, "Published lessons: {lesson_count}")?;
            if !can_manage {
                writeln!(out, "(read only)")?;
            }
            writeln!(out)?;
            for summary in lessons {
                writeln!(
                    out,
                    "  {:<14} {:>3} attempts  {:>3}% avg  {:>3}% completed  {}",
                    summary.lesson_id,
                    summary.stats.total_attempts,
                    summary.stats.avg_score,
                    summary.stats.completion_rate,
                    summary.title
                )?;
            }
        }
    }
    Ok(())
}
