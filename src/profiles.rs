//! Profile records
//!
//! One row per subject id linking the identity platform's user to a stored
//! role and display data. Rows live in the platform's relational store.

use crate::auth::{Identity, Role};
use crate::error::ApiResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Subject id issued by the identity platform (primary key)
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Raw stored value, see [`Profile::role`]
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn role(&self) -> Role {
        Role::from_stored(&self.role)
    }
}

/// Insert payload for a new profile row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

impl NewProfile {
    /// Profile for a freshly verified identity. Always starts as `user`.
    pub fn for_identity(identity: &Identity, display_name: Option<String>) -> Self {
        Self {
            id: identity.subject_id.clone(),
            email: identity.email.clone(),
            display_name: display_name.or_else(|| identity.display_name().map(String::from)),
            role: Role::User,
        }
    }
}

/// Persistence for profile records
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Stored role value for `subject_id`, `None` when no row exists
    async fn find_role_by_subject_id(&self, subject_id: &str) -> ApiResult<Option<String>>;

    async fn find_by_subject_id(&self, subject_id: &str) -> ApiResult<Option<Profile>>;

    /// Insert a row. Fails with `AppError::Conflict` if one already exists.
    async fn create(&self, profile: NewProfile) -> ApiResult<Profile>;

    async fn delete(&self, subject_id: &str) -> ApiResult<()>;

    async fn list(&self) -> ApiResult<Vec<Profile>>;
}
