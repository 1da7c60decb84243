//! Notifier port - outbound messages to users about posts.

use async_trait::async_trait;

use crate::domain::{Post, User};

/// Delivers messages to users. Implementations may hand off to a mail
/// provider, a queue, or a log sink; the handler never blocks on delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one aggregated digest to `user` covering every post in `posts`.
    ///
    /// A digest is a single logical operation: it either reaches the user as
    /// one message or fails as a whole. Callers must not fall back to
    /// per-post sends.
    async fn send_digest(&self, user: &User, posts: &[Post]) -> Result<(), NotifyError>;
}

/// Notification delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Recipient rejected: {0}")]
    Rejected(String),
}
