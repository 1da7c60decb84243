//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod job_queue;
mod notifier;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use job_queue::{Job, JobQueue, JobQueueError, JobResult, QueueStats};
pub use notifier::{Notifier, NotifyError};
pub use repository::{BaseRepository, PostRepository, UserRepository};
