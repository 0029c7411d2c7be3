//! Verified identities and the identity provider seam

use crate::error::ApiResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A caller verified by the identity platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    /// Provider metadata as returned by the platform (display name, avatar, ...)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Identity {
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Display name from provider metadata.
    ///
    /// Password sign-ups store `name`; OAuth providers usually send `full_name`.
    pub fn display_name(&self) -> Option<&str> {
        ["name", "full_name", "user_name"]
            .iter()
            .find_map(|key| {
                self.metadata
                    .get(*key)
                    .and_then(|v| v.as_str())
                    .filter(|name| !name.trim().is_empty())
            })
    }
}

/// Account creation input
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Session issued by the platform after a password sign-in
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub identity: Identity,
}

/// Identity platform operations.
///
/// Tokens are issued and verified by the platform; implementors only forward.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to the identity it was issued for.
    /// Invalid or expired tokens yield `AppError::Unauthorized`.
    async fn verify(&self, token: &str) -> ApiResult<Identity>;

    async fn create_account(&self, account: NewAccount) -> ApiResult<Identity>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<Session>;

    /// Remove an account, used to undo a half-finished registration
    async fn delete_account(&self, subject_id: &str) -> ApiResult<()>;

    /// URL that starts a third-party sign-in with `provider`
    fn authorize_url(&self, provider: &str, redirect_to: &str) -> ApiResult<String>;
}
