//! Digest mailer backed by the log.
//!
//! Stands in for a real mail provider: each digest is rendered exactly as it
//! would be sent and written to the log as one message. Swapping in SMTP or
//! an email API means implementing `Notifier` against the same rendering.

use async_trait::async_trait;

use quill_core::domain::{Post, User};
use quill_core::ports::{Notifier, NotifyError};

pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogMailer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one aggregated digest body covering all posts.
fn render_digest(user: &User, posts: &[Post]) -> String {
    let mut out = format!(
        "Hi {}, {} post(s) were updated recently:\n",
        user.display_name(),
        posts.len()
    );
    for post in posts {
        out.push_str(&format!("  - {} (updated {})\n", post.title, post.updated_at));
    }
    out
}

#[async_trait]
impl Notifier for LogMailer {
    async fn send_digest(&self, user: &User, posts: &[Post]) -> Result<(), NotifyError> {
        if posts.is_empty() {
            return Ok(());
        }

        let body = render_digest(user, posts);
        tracing::info!(
            recipient = %user.email,
            post_count = posts.len(),
            "Sending recent-posts digest\n{}",
            body
        );
        Ok(())
    }
}
