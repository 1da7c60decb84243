//! Domain entities - the core business objects.

mod actor;

mod post;

mod user;

pub use actor::{Actor, Role};
pub use post::{Post, PostChanges};
pub use user::User;
