//! Background processing: digest worker and cron scheduling.

pub mod notify;

#[cfg(feature = "scheduler")]
pub mod scheduler;

pub use notify::NOTIFY_RECENT_POSTS;

use quill_core::ports::JobQueue;

use crate::state::AppState;

/// Start the job workers that process queued digest runs.
pub async fn start_notify_worker(state: &AppState) {
    let worker_state = state.clone();
    let result = state
        .jobs
        .start_worker(move |job| {
            let state = worker_state.clone();
            Box::pin(async move { notify::handle(state, job).await })
        })
        .await;

    if let Err(e) = result {
        tracing::error!("Failed to start job workers: {}", e);
    }
}

/// Start the cron scheduler that enqueues the periodic digest.
///
/// Returns the scheduler handle; the caller must keep it alive for the
/// lifetime of the server.
#[cfg(feature = "scheduler")]
pub async fn start_scheduler(
    config: &crate::config::AppConfig,
    state: &AppState,
) -> Option<scheduler::Scheduler> {
    use quill_core::ports::Job;

    let sched = match scheduler::Scheduler::new(scheduler::SchedulerConfig::from_env()).await {
        Ok(sched) => sched,
        Err(e) => {
            tracing::error!("Failed to create scheduler: {}", e);
            return None;
        }
    };

    let jobs = state.jobs.clone();
    let registered = sched
        .add_cron(&config.notify_cron, move || {
            let jobs = jobs.clone();
            async move {
                let job = Job::new(NOTIFY_RECENT_POSTS, serde_json::json!({}));
                if let Err(e) = jobs.enqueue(job).await {
                    tracing::error!("Failed to enqueue scheduled digest: {}", e);
                }
            }
        })
        .await;

    if let Err(e) = registered {
        tracing::error!("Failed to register digest cron: {}", e);
        return None;
    }

    if let Err(e) = sched.start().await {
        tracing::error!("Failed to start scheduler: {}", e);
        return None;
    }

    Some(sched)
}
