use std::fmt;

use lms_core::model::{LessonId, OptionId, QuizId, Role};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Users,
    Lessons,
    Show { lesson: LessonId },
    Answer {
        lesson: LessonId,
        quiz: QuizId,
        option: OptionId,
    },
    Progress { lesson: LessonId },
    Stats { lesson: LessonId },
    Dashboard,
    Import { source: Option<String> },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: Option<String>,
    pub role: Role,
    pub json: bool,
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidRole { raw: String },
    InvalidId { name: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidRole { raw } => write!(f, "invalid --as value: {raw}"),
            ArgsError::InvalidId { name, raw } => write!(f, "invalid {name}: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_id<T: std::str::FromStr>(
    positional: &mut impl Iterator<Item = String>,
    command: &'static str,
    name: &'static str,
) -> Result<T, ArgsError> {
    let raw = positional
        .next()
        .ok_or(ArgsError::MissingArgument { command, name })?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidId { name, raw: raw.clone() })
}

impl Args {
    /// Parses flags and one command from `args` (program name excluded).
    ///
    /// Flags override the values already loaded into `config`.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        config: &Config,
    ) -> Result<Self, ArgsError> {
        let mut db_url = config.db_url.clone();
        let mut role = config.role;
        let mut json = false;
        let mut positional = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(value);
                }
                "--as" => {
                    let value = require_value(&mut args, "--as")?;
                    role = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidRole { raw: value.clone() })?;
                }
                "--json" => json = true,
                "--help" | "-h" => positional.push("help".to_owned()),
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let command = match positional.next().as_deref() {
            None | Some("help") => Command::Help,
            Some("users") => Command::Users,
            Some("lessons") => Command::Lessons,
            Some("show") => Command::Show {
                lesson: require_id(&mut positional, "show", "lesson")?,
            },
            Some("answer") => Command::Answer {
                lesson: require_id(&mut positional, "answer", "lesson")?,
                quiz: require_id(&mut positional, "answer", "quiz")?,
                option: require_id(&mut positional, "answer", "option")?,
            },
            Some("progress") => Command::Progress {
                lesson: require_id(&mut positional, "progress", "lesson")?,
            },
            Some("stats") => Command::Stats {
                lesson: require_id(&mut positional, "stats", "lesson")?,
            },
            Some("dashboard") => Command::Dashboard,
            Some("import") => Command::Import {
                source: positional.next(),
            },
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Self {
            db_url,
            role,
            json,
            command,
        })
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  lms [options] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  users                          List the user directory");
    eprintln!("  lessons                        List lessons in catalogue order");
    eprintln!("  show <lesson>                  Show a lesson, its note, and its questions");
    eprintln!("  answer <lesson> <quiz> <opt>   Answer a question (students only)");
    eprintln!("  progress <lesson>              Progress of the current user on a lesson");
    eprintln!("  stats <lesson>                 Attempt statistics for a lesson");
    eprintln!("  dashboard                      Dashboard for the current role");
    eprintln!("  import [file]                  Import a lesson package (admin, mentor)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>              SQLite URL (default: in-memory)");
    eprintln!("  --as <role>                    admin, mentor, student, or parent (default: admin)");
    eprintln!("  --json                         JSON output for dashboard, stats, and import");
    eprintln!("  -h, --help                     Show this help");
    eprintln!();
    eprintln!("An empty store is seeded with the demo users and lesson on first use.");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LMS_DB_URL, LMS_ROLE, RUST_LOG");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse_from(args.iter().map(|s| (*s).to_owned()), &Config::default())
    }

    #[test]
    fn no_command_is_help() {
        assert_eq!(parse(&[]).unwrap().command, Command::Help);
        assert_eq!(parse(&["-h"]).unwrap().command, Command::Help);
    }

    #[test]
    fn parses_answer_with_flags_anywhere() {
        let args = parse(&[
            "answer",
            "GENESIS-CH1",
            "--as",
            "student",
            "GEN1-Q1",
            "A",
            "--db",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(args.role, Role::Student);
        assert_eq!(args.db_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(
            args.command,
            Command::Answer {
                lesson: LessonId::new("GENESIS-CH1"),
                quiz: QuizId::new("GEN1-Q1"),
                option: OptionId::new("A"),
            }
        );
    }

    #[test]
    fn flags_override_config() {
        let config = Config {
            db_url: Some("sqlite:env.sqlite3".into()),
            role: Role::Mentor,
            log_filter: "info".into(),
        };
        let args = Args::parse_from(["dashboard".to_owned()], &config).unwrap();
        assert_eq!(args.role, Role::Mentor);
        assert_eq!(args.db_url.as_deref(), Some("sqlite:env.sqlite3"));

        let args =
            Args::parse_from(["--as".to_owned(), "parent".to_owned()], &config).unwrap();
        assert_eq!(args.role, Role::Parent);
    }

    #[test]
    fn import_source_is_optional() {
        assert_eq!(parse(&["import"]).unwrap().command, Command::Import { source: None });
        assert_eq!(
            parse(&["import", "genesis.xlsx", "--json"]).unwrap(),
            Args {
                db_url: None,
                role: Role::Admin,
                json: true,
                command: Command::Import {
                    source: Some("genesis.xlsx".into())
                },
            }
        );
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!(
            parse(&["show"]).unwrap_err(),
            ArgsError::MissingArgument {
                command: "show",
                name: "lesson"
            }
        );
        assert_eq!(
            parse(&["--as"]).unwrap_err(),
            ArgsError::MissingValue { flag: "--as" }
        );
        assert_eq!(
            parse(&["--as", "owner"]).unwrap_err(),
            ArgsError::InvalidRole { raw: "owner".into() }
        );
        assert_eq!(
            parse(&["publish"]).unwrap_err(),
            ArgsError::UnknownCommand("publish".into())
        );
        assert_eq!(
            parse(&["seed"]).unwrap_err(),
            ArgsError::UnknownCommand("seed".into())
        );
        assert_eq!(
            parse(&["users", "extra"]).unwrap_err(),
            ArgsError::UnknownArg("extra".into())
        );
        assert_eq!(
            parse(&["--verbose"]).unwrap_err(),
            ArgsError::UnknownArg("--verbose".into())
        );
        assert!(matches!(
            parse(&["progress", "  "]).unwrap_err(),
            ArgsError::InvalidId { name: "lesson", .. }
        ));
    }
}
