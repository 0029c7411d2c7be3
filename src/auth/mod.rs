//! Authentication and authorization module
//!
//! Identity verification is delegated to the hosted platform; this module
//! decides the caller's role and gates elevated operations.

mod identity;
mod middleware;
mod resolver;

pub use identity::{Identity, IdentityProvider, NewAccount, Session};
pub use middleware::{require_role, AuthUser, BearerToken, RequireAdmin};
pub use resolver::{AuthContext, RoleResolver};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular signed-in account
    User,
    /// Can reach the admin operations
    Admin,
}

impl Role {
    /// Map a role value read from the profile store.
    ///
    /// Anything other than `admin` or `user` is downgraded to `user`.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            "user" => Role::User,
            other => {
                warn!("Unrecognized stored role {:?}, treating as user", other);
                Role::User
            }
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
