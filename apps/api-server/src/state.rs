//! Application state - shared across all handlers.
//!
//! Repositories are the store; handlers query them per request and never
//! hold post collections across requests.

use std::sync::Arc;

use quill_core::ports::{Notifier, PostRepository, UserRepository};
use quill_infra::jobs::InMemoryJobQueue;
use quill_infra::notify::LogMailer;

#[cfg(feature = "postgres")]
use quill_infra::database::{DatabaseConnections, PostgresPostRepository, PostgresUserRepository};

use crate::config::AppConfig;
use crate::memory::{InMemoryPostRepository, InMemoryUserRepository};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub jobs: Arc<InMemoryJobQueue>,
    /// Staleness window for digests, in hours.
    pub notify_window_hours: i64,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let (posts, users): (Arc<dyn PostRepository>, Arc<dyn UserRepository>) = {
            if let Some(db_config) = &config.database {
                match DatabaseConnections::init(db_config).await {
                    Ok(connections) => (
                        Arc::new(PostgresPostRepository::new(connections.main.clone())),
                        Arc::new(PostgresUserRepository::new(connections.main)),
                    ),
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory store.",
                            e
                        );
                        in_memory_repos()
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running with the in-memory store.");
                in_memory_repos()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (posts, users): (Arc<dyn PostRepository>, Arc<dyn UserRepository>) = {
            tracing::info!("Running without postgres feature - using the in-memory store");
            in_memory_repos()
        };

        tracing::info!("Application state initialized");

        Self {
            posts,
            users,
            notifier: Arc::new(LogMailer::new()),
            jobs: Arc::new(InMemoryJobQueue::from_env()),
            notify_window_hours: config.notify_window_hours,
        }
    }
}

fn in_memory_repos() -> (Arc<dyn PostRepository>, Arc<dyn UserRepository>) {
    (
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryUserRepository::new()),
    )
}
