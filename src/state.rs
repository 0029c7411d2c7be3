//! Application state management
//!
//! Contains shared state accessible across all handlers.
//! Everything in here is immutable after startup; the platform clients are
//! stateless apart from their pooled HTTP connections.

use crate::auth::{IdentityProvider, RoleResolver};
use crate::config::Settings;
use crate::error::AppError;
use crate::platform::{PlatformClient, PlatformIdentity, PlatformProfiles, PlatformStorage};
use crate::profiles::ProfileStore;
use crate::storage::UploadUrlIssuer;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Identity platform (token verification, accounts, OAuth URLs)
    pub identity: Arc<dyn IdentityProvider>,

    /// Profile records holding stored roles
    pub profiles: Arc<dyn ProfileStore>,

    /// Signed upload URL issuer
    pub uploads: Arc<dyn UploadUrlIssuer>,

    /// Role decision procedure, carries the fail-safe admin email
    pub resolver: RoleResolver,

    /// Default post-authentication redirect target
    pub redirect_url: String,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        uploads: Arc<dyn UploadUrlIssuer>,
    ) -> Self {
        Self {
            identity,
            profiles,
            uploads,
            resolver: RoleResolver::new(settings.auth.fail_safe_admin_email.clone()),
            redirect_url: settings.auth.redirect_url.clone(),
        }
    }

    /// Wire every collaborator to the hosted platform
    pub fn from_platform(settings: &Settings) -> Result<Self, AppError> {
        let client = PlatformClient::new(&settings.platform)?;

        Ok(Self::new(
            settings,
            Arc::new(PlatformIdentity::new(client.clone())),
            Arc::new(PlatformProfiles::new(
                client.clone(),
                settings.platform.profiles_table.clone(),
            )),
            Arc::new(PlatformStorage::new(
                client,
                settings.platform.storage_bucket.clone(),
            )),
        ))
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
