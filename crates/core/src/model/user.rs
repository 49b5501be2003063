use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::UserId;

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

/// Role of a user; decides which dashboards and actions are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Mentor,
    Student,
    Parent,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Mentor => "mentor",
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }

    /// Admins and mentors may import, build, and save lessons.
    #[must_use]
    pub fn can_manage_curriculum(self) -> bool {
        matches!(self, Role::Admin | Role::Mentor)
    }

    /// Only students record quiz attempts.
    #[must_use]
    pub fn can_take_quizzes(self) -> bool {
        matches!(self, Role::Student)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "mentor" => Ok(Role::Mentor),
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(
        id: impl Into<UserId>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            avatar_url: None,
        }
    }

    #[must_use]
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// First word of the display name, used in greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("STUDENT".parse::<Role>().unwrap(), Role::Student);
        assert_eq!(" Mentor ".parse::<Role>().unwrap(), Role::Mentor);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn capabilities_follow_role() {
        assert!(Role::Admin.can_manage_curriculum());
        assert!(Role::Mentor.can_manage_curriculum());
        assert!(!Role::Student.can_manage_curriculum());
        assert!(!Role::Parent.can_manage_curriculum());
        assert!(Role::Student.can_take_quizzes());
        assert!(!Role::Admin.can_take_quizzes());
    }

    #[test]
    fn first_name_splits_on_whitespace() {
        let user = User::new("admin1", "Sarah Admin", "sarah@lms.com", Role::Admin);
        assert_eq!(user.first_name(), "Sarah");
    }

    #[test]
    fn role_serializes_uppercase() {
        let json = serde_json::to_string(&Role::Mentor).unwrap();
        assert_eq!(json, "\"MENTOR\"");
    }
}
