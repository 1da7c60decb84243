//! Notifier implementations.

mod mailer;

pub use mailer::LogMailer;
