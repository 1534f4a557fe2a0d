use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::comment::is_valid_email;
use crate::error::DomainError;

pub const USERNAME_MAX_LEN: usize = 150;

/// User entity - a post author. Credentials live with the external auth
/// system; only identity is kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Result<Self, DomainError> {
        let now = Utc::now();
        let user = Self {
            id: Uuid::new_v4(),
            username: username.into().trim().to_string(),
            email: email.into().trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let valid_chars = self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c));
        if self.username.is_empty()
            || self.username.chars().count() > USERNAME_MAX_LEN
            || !valid_chars
        {
            return Err(DomainError::validation(format!(
                "Username must be 1-{USERNAME_MAX_LEN} letters, digits or @/./+/-/_"
            )));
        }
        if !is_valid_email(&self.email) {
            return Err(DomainError::validation("Enter a valid email address"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user() {
        let user = User::new("django", "django@example.com").unwrap();
        assert_eq!(user.username, "django");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_invalid_username() {
        assert!(User::new("", "a@b.io").is_err());
        assert!(User::new("has space", "a@b.io").is_err());
        assert!(User::new("ok", "nope").is_err());
    }
}
