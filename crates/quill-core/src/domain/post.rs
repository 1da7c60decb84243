use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Actor, Role};
use crate::error::DomainError;

/// Post entity - a blog post owned by the user who created it.
///
/// `author_id` is set once at creation from the authenticated caller and is
/// never writable afterwards, by any path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a caller may change on an existing post.
///
/// `author_id` is deliberately absent: ownership is not editable.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl Post {
    /// Create a new draft post authored by `author_id`.
    ///
    /// Fails with `DomainError::Validation` when title or body is empty or
    /// whitespace-only.
    pub fn new(author_id: Uuid, title: String, body: String) -> Result<Self, DomainError> {
        validate_text("title", &title)?;
        validate_text("body", &body)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            body,
            published: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply caller-supplied changes. Only the author may update a post.
    pub fn apply_update(&mut self, actor: &Actor, changes: PostChanges) -> Result<(), DomainError> {
        if actor.id != self.author_id {
            return Err(DomainError::Forbidden);
        }

        if let Some(title) = &changes.title {
            validate_text("title", title)?;
        }
        if let Some(body) = &changes.body {
            validate_text("body", body)?;
        }

        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(body) = changes.body {
            self.body = body;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transition draft -> published. The only legal way `published` changes.
    ///
    /// The author and editors may publish. Publishing an already-published
    /// post is a no-op.
    pub fn publish(&mut self, actor: &Actor) -> Result<(), DomainError> {
        if actor.id != self.author_id && !actor.has_role(Role::Editor) {
            return Err(DomainError::Forbidden);
        }
        if !self.published {
            self.published = true;
            self.updated_at = Utc::now();
        }
        Ok(())
    }

    /// The author may delete their own posts; admins may delete any post.
    pub fn deletable_by(&self, actor: &Actor) -> bool {
        actor.id == self.author_id || actor.has_role(Role::Admin)
    }

    /// Staleness predicate for notification digests: strictly after the cutoff.
    pub fn updated_after(&self, cutoff: DateTime<Utc>) -> bool {
        self.updated_at > cutoff
    }
}

fn validate_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
