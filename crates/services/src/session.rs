//! Who is acting right now.
//!
//! A `Session` is passed explicitly to whatever needs the current user.
//! It holds a snapshot of the user directory and never writes to storage.

use lms_core::model::{Role, User, UserId};
use storage::repository::UserRepository;
use tracing::{debug, info};

use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    users: Vec<User>,
    current: usize,
}

impl Session {
    /// Starts a session on the first user of the directory.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoUsers` when `users` is empty.
    pub fn new(users: Vec<User>) -> Result<Self, SessionError> {
        if users.is_empty() {
            return Err(SessionError::NoUsers);
        }
        Ok(Self { users, current: 0 })
    }

    /// Loads the user directory and starts a session on its first user.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the directory cannot be read.
    /// Returns `SessionError::NoUsers` if it is empty.
    pub async fn load(users: &dyn UserRepository) -> Result<Self, SessionError> {
        let users = users.list_users().await?;
        debug!(count = users.len(), "loaded user directory");
        Self::new(users)
    }

    #[must_use]
    pub fn current(&self) -> &User {
        &self.users[self.current]
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Makes the first user holding `role` current.
    ///
    /// Returns `None` and keeps the current user when nobody has that role.
    pub fn switch_role(&mut self, role: Role) -> Option<&User> {
        let index = self.users.iter().position(|u| u.role == role)?;
        self.select(index)
    }

    /// Makes the user with `id` current.
    ///
    /// Returns `None` and keeps the current user when the id is unknown.
    pub fn switch_user(&mut self, id: &UserId) -> Option<&User> {
        let index = self.users.iter().position(|u| &u.id == id)?;
        self.select(index)
    }

    fn select(&mut self, index: usize) -> Option<&User> {
        self.current = index;
        let user = &self.users[index];
        info!(user = %user.id, role = %user.role, "switched current user");
        Some(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::seed::demo_users;

    #[test]
    fn starts_on_first_user() {
        let session = Session::new(demo_users()).unwrap();
        assert_eq!(session.current().id.as_str(), "admin1");
        assert_eq!(session.current().role, Role::Admin);
    }

    #[test]
    fn empty_directory_is_rejected() {
        assert!(matches!(Session::new(Vec::new()), Err(SessionError::NoUsers)));
    }

    #[test]
    fn switch_role_selects_first_match() {
        let mut session = Session::new(demo_users()).unwrap();
        let user = session.switch_role(Role::Student).unwrap();
        assert_eq!(user.id.as_str(), "student1");
        assert_eq!(session.current().role, Role::Student);

        let mentor = session.switch_role(Role::Mentor).unwrap();
        assert_eq!(mentor.name, "Mike Mentor");
    }

    #[test]
    fn switch_to_missing_role_keeps_current_user() {
        let mut session = Session::new(demo_users()).unwrap();
        session.switch_role(Role::Student).unwrap();

        assert!(session.switch_role(Role::Parent).is_none());
        assert_eq!(session.current().id.as_str(), "student1");
    }

    #[test]
    fn switch_user_by_id() {
        let mut session = Session::new(demo_users()).unwrap();
        assert!(session.switch_user(&UserId::new("mentor1")).is_some());
        assert_eq!(session.current().role, Role::Mentor);
        assert!(session.switch_user(&UserId::new("ghost")).is_none());
        assert_eq!(session.current().role, Role::Mentor);
    }
}
