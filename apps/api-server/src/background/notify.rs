//! Recent-posts digest job.
//!
//! One run selects every post updated after the cutoff (one query), loads
//! all users (one query), and sends exactly one aggregated message per user.

use chrono::{TimeDelta, Utc};

use quill_core::error::RepoError;
use quill_core::ports::{Job, JobResult};

use crate::state::AppState;

/// Job type routed to this handler.
pub const NOTIFY_RECENT_POSTS: &str = "notify_recent_posts";

/// Outcome of one digest run.
#[derive(Debug, Default)]
pub struct DigestOutcome {
    /// Qualifying posts in the window.
    pub posts: usize,
    /// Users that received a digest.
    pub notified: usize,
    /// Users whose delivery failed.
    pub failed: usize,
}

/// Job queue entry point.
pub async fn handle(state: AppState, job: Job) -> JobResult {
    match job.job_type.as_str() {
        NOTIFY_RECENT_POSTS => match run_digest(&state).await {
            Ok(outcome) => {
                tracing::info!(
                    posts = outcome.posts,
                    notified = outcome.notified,
                    failed = outcome.failed,
                    "Digest run complete"
                );
                JobResult::Success
            }
            Err(e) => JobResult::Retry(e.to_string()),
        },
        other => JobResult::Failed(format!("Unknown job type: {other}")),
    }
}

/// Execute one digest run against the store.
///
/// Store failures abort the whole run (the job retries); a delivery failure
/// only fails that user's digest and is logged.
pub async fn run_digest(state: &AppState) -> Result<DigestOutcome, RepoError> {
    let cutoff = Utc::now() - TimeDelta::hours(state.notify_window_hours);

    let recent = state.posts.updated_since(cutoff).await?;
    if recent.is_empty() {
        tracing::debug!("No posts updated since {}, nothing to send", cutoff);
        return Ok(DigestOutcome::default());
    }

    // One bulk query for the recipient set, never row-by-row.
    let users = state.users.list_all().await?;

    let mut outcome = DigestOutcome {
        posts: recent.len(),
        ..Default::default()
    };

    for user in &users {
        match state.notifier.send_digest(user, &recent).await {
            Ok(()) => outcome.notified += 1,
            Err(e) => {
                outcome.failed += 1;
                tracing::error!(recipient = %user.email, "Digest delivery failed: {}", e);
            }
        }
    }

    Ok(outcome)
}
