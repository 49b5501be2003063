use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error type for parsing an identifier from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse {kind} from string")]
pub struct ParseIdError {
    kind: &'static str,
}

impl ParseIdError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

/// Declares a string-backed identifier with `Display`, `Debug`, and `FromStr`.
///
/// Parsing trims surrounding whitespace and rejects empty input.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self(trimmed.to_owned()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id! {
    /// Unique identifier for a user (e.g. `student1`).
    UserId
}

string_id! {
    /// Unique identifier for a lesson (e.g. `GENESIS-CH1`).
    LessonId
}

string_id! {
    /// Unique identifier for a quiz question (e.g. `GEN1-Q1`).
    QuizId
}

string_id! {
    /// Short option label within a question (`A`, `B`, `C`, ...).
    OptionId
}

impl OptionId {
    /// Label for the option at `index` in a question: 0 → `A`, 1 → `B`, ...
    ///
    /// Returns `None` past `Z`.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        let offset = u8::try_from(index).ok().filter(|i| *i < 26)?;
        Some(Self(char::from(b'A' + offset).to_string()))
    }
}

/// Unique identifier for a recorded attempt.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttemptId({})", self.0)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AttemptId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(AttemptId)
            .map_err(|_| ParseIdError { kind: "AttemptId" })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
