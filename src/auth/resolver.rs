//! Role resolution
//!
//! Decides `admin` vs `user` for a verified identity. The configured fail-safe
//! email is checked first and never touches the profile store, so that account
//! keeps working while the store is down. Everyone else gets the role stored in
//! their profile, or `user` when there is none or the lookup fails.

use super::{Identity, Role};
use crate::profiles::ProfileStore;
use serde::Serialize;
use tracing::{debug, warn};

/// Result of authenticating a request: who the caller is and what they may do
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthContext {
    pub identity: Identity,
    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Maps verified identities to roles
#[derive(Debug, Clone)]
pub struct RoleResolver {
    fail_safe_admin_email: String,
}

impl RoleResolver {
    pub fn new(fail_safe_admin_email: impl Into<String>) -> Self {
        Self {
            fail_safe_admin_email: fail_safe_admin_email.into(),
        }
    }

    /// Exact, case-sensitive match against the configured email.
    /// An empty configuration never matches.
    pub fn is_fail_safe_admin(&self, identity: &Identity) -> bool {
        !self.fail_safe_admin_email.is_empty() && identity.email == self.fail_safe_admin_email
    }

    /// Resolve the caller's role. Never fails: lookup errors fall back to `user`.
    pub async fn resolve(&self, identity: &Identity, store: &dyn ProfileStore) -> Role {
        if self.is_fail_safe_admin(identity) {
            debug!(subject = %identity.subject_id, "Fail-safe admin matched");
            return Role::Admin;
        }

        match store.find_role_by_subject_id(&identity.subject_id).await {
            Ok(Some(stored)) => Role::from_stored(&stored),
            Ok(None) => {
                debug!(subject = %identity.subject_id, "No profile found, defaulting to user");
                Role::User
            }
            Err(e) => {
                warn!(subject = %identity.subject_id, "Role lookup failed, defaulting to user: {}", e);
                Role::User
            }
        }
    }

    /// Build the full authentication result for a verified identity
    pub async fn context_for(&self, identity: Identity, store: &dyn ProfileStore) -> AuthContext {
        let role = self.resolve(&identity, store).await;
        AuthContext { identity, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingProfileStore, InMemoryProfileStore, UnreachableProfileStore};

    const FAIL_SAFE: &str = "admin@example.com";

    fn resolver() -> RoleResolver {
        RoleResolver::new(FAIL_SAFE)
    }

    #[tokio::test]
    async fn test_fail_safe_email_without_profile() {
        let store = InMemoryProfileStore::new();
        let identity = Identity::new("u1", "admin@example.com");

        assert_eq!(resolver().resolve(&identity, &store).await, Role::Admin);
    }

    #[tokio::test]
    async fn test_fail_safe_email_survives_store_errors() {
        let identity = Identity::new("u1", FAIL_SAFE);
        assert_eq!(resolver().resolve(&identity, &FailingProfileStore).await, Role::Admin);
    }

    #[tokio::test]
    async fn test_fail_safe_check_skips_lookup() {
        // UnreachableProfileStore panics if it is queried at all
        let identity = Identity::new("u1", FAIL_SAFE);
        assert_eq!(resolver().resolve(&identity, &UnreachableProfileStore).await, Role::Admin);
    }

    #[tokio::test]
    async fn test_fail_safe_match_is_case_sensitive() {
        let store = InMemoryProfileStore::new();
        let identity = Identity::new("u1", "Admin@Example.com");

        assert_eq!(resolver().resolve(&identity, &store).await, Role::User);
    }

    #[tokio::test]
    async fn test_stored_admin_role() {
        let store = InMemoryProfileStore::new();
        store.seed("u2", "carol@example.com", "admin").await;
        let identity = Identity::new("u2", "carol@example.com");

        assert_eq!(resolver().resolve(&identity, &store).await, Role::Admin);
    }

    #[tokio::test]
    async fn test_stored_user_role() {
        let store = InMemoryProfileStore::new();
        store.seed("u4", "erin@example.com", "user").await;
        let identity = Identity::new("u4", "erin@example.com");

        assert_eq!(resolver().resolve(&identity, &store).await, Role::User);
    }

    #[tokio::test]
    async fn test_missing_profile_defaults_to_user() {
        let store = InMemoryProfileStore::new();
        let identity = Identity::new("u3", "dave@example.com");

        assert_eq!(resolver().resolve(&identity, &store).await, Role::User);
    }

    #[tokio::test]
    async fn test_lookup_error_defaults_to_user() {
        let identity = Identity::new("u3", "dave@example.com");
        assert_eq!(resolver().resolve(&identity, &FailingProfileStore).await, Role::User);
    }

    #[tokio::test]
    async fn test_unknown_stored_role_defaults_to_user() {
        let store = InMemoryProfileStore::new();
        store.seed("u5", "frank@example.com", "owner").await;
        let identity = Identity::new("u5", "frank@example.com");

        assert_eq!(resolver().resolve(&identity, &store).await, Role::User);
    }

    #[tokio::test]
    async fn test_empty_fail_safe_never_matches() {
        let store = InMemoryProfileStore::new();
        let identity = Identity::new("u6", "");

        assert_eq!(RoleResolver::new("").resolve(&identity, &store).await, Role::User);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        tokio_test::block_on(async {
            let store = InMemoryProfileStore::new();
            store.seed("u2", "carol@example.com", "admin").await;
            let resolver = resolver();

            for identity in [
                Identity::new("u1", FAIL_SAFE),
                Identity::new("u2", "carol@example.com"),
                Identity::new("u3", "dave@example.com"),
            ] {
                let first = resolver.resolve(&identity, &store).await;
                let second = resolver.resolve(&identity, &store).await;
                assert_eq!(first, second);
            }
        });
    }

    #[tokio::test]
    async fn test_context_for_carries_identity() {
        let store = InMemoryProfileStore::new();
        let context = resolver()
            .context_for(Identity::new("u1", FAIL_SAFE), &store)
            .await;

        assert!(context.is_admin());
        assert_eq!(context.identity.subject_id, "u1");
    }
}
