use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::next_timestamp;
use crate::error::DomainError;

pub const NAME_MAX_LEN: usize = 80;
pub const EMAIL_MAX_LEN: usize = 254;

/// Comment entity - a reader's reply to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub name: String,
    pub email: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Moderation flag; inactive comments are hidden from readers.
    pub active: bool,
}

impl Comment {
    /// Create a validated, active comment.
    pub fn new(
        post_id: Uuid,
        name: impl Into<String>,
        email: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        let comment = Self {
            id: Uuid::new_v4(),
            post_id,
            name: name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            body: body.into(),
            created: now,
            updated: now,
            active: true,
        };
        comment.validate()?;
        Ok(comment)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() || self.name.chars().count() > NAME_MAX_LEN {
            return Err(DomainError::validation(format!(
                "Name must be 1-{NAME_MAX_LEN} characters"
            )));
        }
        if !is_valid_email(&self.email) {
            return Err(DomainError::validation("Enter a valid email address"));
        }
        if self.body.trim().is_empty() {
            return Err(DomainError::validation("Comment body is required"));
        }
        Ok(())
    }

    /// Toggle visibility.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.updated = next_timestamp(self.updated);
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Comment by {} on {}", self.name, self.post_id)
    }
}

/// Default comment ordering: oldest first.
pub fn default_comment_order(a: &Comment, b: &Comment) -> Ordering {
    a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id))
}

/// Loose `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
