use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Post, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update) as one atomic write.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. `RepoError::NotFound` when no row matched.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// All users, loaded in a single query. Used for notification fan-out.
    async fn list_all(&self) -> Result<Vec<User>, RepoError>;
}

/// Post repository. Every read is a fresh query against the store; results
/// must never be held across requests.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All posts, newest first.
    async fn list(&self) -> Result<Vec<Post>, RepoError>;

    /// Drafts awaiting publication.
    async fn list_pending(&self) -> Result<Vec<Post>, RepoError>;

    /// Posts authored by the given user.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// Posts whose `updated_at` is strictly after the cutoff.
    async fn updated_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Post>, RepoError>;
}
