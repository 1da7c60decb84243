use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles that grant rights beyond post ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May publish any post.
    Editor,
    /// May delete any post.
    Admin,
}

impl Role {
    /// Parse a role name as carried in token claims. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "editor" => Some(Role::Editor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

/// The authenticated caller acting on a resource.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn new(id: Uuid, roles: Vec<Role>) -> Self {
        Self { id, roles }
    }

    /// An actor with no roles beyond ownership.
    pub fn user(id: Uuid) -> Self {
        Self { id, roles: Vec::new() }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
