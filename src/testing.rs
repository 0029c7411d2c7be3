//! In-memory collaborators for unit tests

use crate::auth::{Identity, IdentityProvider, NewAccount, Session};
use crate::config::Settings;
use crate::error::{unauthorized, ApiResult, AppError};
use crate::profiles::{NewProfile, Profile, ProfileStore};
use crate::state::{AppState, SharedState};
use crate::storage::{SignedUpload, UploadUrlIssuer};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

pub const FAIL_SAFE_EMAIL: &str = "admin@example.com";

/// Profile store over a `HashMap`
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
    fail_creates: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row with a raw stored role value
    pub async fn seed(&self, subject_id: &str, email: &str, role: &str) {
        let now = Utc::now();
        self.profiles.write().await.insert(
            subject_id.to_string(),
            Profile {
                id: subject_id.to_string(),
                email: email.to_string(),
                display_name: None,
                role: role.to_string(),
                created_at: now,
                updated_at: now,
            },
        );
    }

    /// Make every subsequent `create` fail
    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    pub async fn contains(&self, subject_id: &str) -> bool {
        self.profiles.read().await.contains_key(subject_id)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_role_by_subject_id(&self, subject_id: &str) -> ApiResult<Option<String>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(subject_id).map(|p| p.role.clone()))
    }

    async fn find_by_subject_id(&self, subject_id: &str) -> ApiResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(subject_id).cloned())
    }

    async fn create(&self, profile: NewProfile) -> ApiResult<Profile> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(AppError::Upstream {
                status: 500,
                message: "insert failed".to_string(),
            });
        }

        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.id) {
            return Err(AppError::Conflict("Profile already exists".to_string()));
        }

        let now = Utc::now();
        let created = Profile {
            id: profile.id.clone(),
            email: profile.email,
            display_name: profile.display_name,
            role: profile.role.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        profiles.insert(profile.id, created.clone());

        Ok(created)
    }

    async fn delete(&self, subject_id: &str) -> ApiResult<()> {
        self.profiles.write().await.remove(subject_id);
        Ok(())
    }

    async fn list(&self) -> ApiResult<Vec<Profile>> {
        let mut all: Vec<Profile> = self.profiles.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

/// Every call errors, as if the store were unreachable
pub struct FailingProfileStore;

#[async_trait]
impl ProfileStore for FailingProfileStore {
    async fn find_role_by_subject_id(&self, _subject_id: &str) -> ApiResult<Option<String>> {
        Err(AppError::Upstream {
            status: 503,
            message: "store unavailable".to_string(),
        })
    }

    async fn find_by_subject_id(&self, _subject_id: &str) -> ApiResult<Option<Profile>> {
        Err(AppError::Upstream {
            status: 503,
            message: "store unavailable".to_string(),
        })
    }

    async fn create(&self, _profile: NewProfile) -> ApiResult<Profile> {
        Err(AppError::Upstream {
            status: 503,
            message: "store unavailable".to_string(),
        })
    }

    async fn delete(&self, _subject_id: &str) -> ApiResult<()> {
        Ok(())
    }

    async fn list(&self) -> ApiResult<Vec<Profile>> {
        Ok(Vec::new())
    }
}

/// Panics on any lookup; proves a code path never reaches the store
pub struct UnreachableProfileStore;

#[async_trait]
impl ProfileStore for UnreachableProfileStore {
    async fn find_role_by_subject_id(&self, subject_id: &str) -> ApiResult<Option<String>> {
        panic!("profile store queried for {}", subject_id)
    }

    async fn find_by_subject_id(&self, subject_id: &str) -> ApiResult<Option<Profile>> {
        panic!("profile store queried for {}", subject_id)
    }

    async fn create(&self, profile: NewProfile) -> ApiResult<Profile> {
        panic!("profile store create for {}", profile.id)
    }

    async fn delete(&self, subject_id: &str) -> ApiResult<()> {
        panic!("profile store delete for {}", subject_id)
    }

    async fn list(&self) -> ApiResult<Vec<Profile>> {
        panic!("profile store listed")
    }
}

/// Identity provider with a fixed token table
#[derive(Default)]
pub struct StubIdentityProvider {
    tokens: Mutex<HashMap<String, Identity>>,
    passwords: Mutex<HashMap<String, (String, Identity)>>,
    deleted: Mutex<Vec<String>>,
}

impl StubIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, token: &str, identity: Identity) -> Self {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), identity);
        self
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn verify(&self, token: &str) -> ApiResult<Identity> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| unauthorized("Invalid or expired token"))
    }

    async fn create_account(&self, account: NewAccount) -> ApiResult<Identity> {
        let mut passwords = self.passwords.lock().unwrap();
        if passwords.contains_key(&account.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let mut identity = Identity::new(format!("sub-{}", passwords.len() + 1), &account.email);
        identity.metadata = serde_json::json!({ "name": account.display_name });
        passwords.insert(account.email, (account.password, identity.clone()));
        Ok(identity)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<Session> {
        let passwords = self.passwords.lock().unwrap();
        match passwords.get(email) {
            Some((stored, identity)) if stored == password => Ok(Session {
                access_token: format!("token-{}", identity.subject_id),
                refresh_token: "refresh".to_string(),
                token_type: "bearer".to_string(),
                expires_in: 3600,
                identity: identity.clone(),
            }),
            _ => Err(unauthorized("Invalid email or password")),
        }
    }

    async fn delete_account(&self, subject_id: &str) -> ApiResult<()> {
        self.deleted.lock().unwrap().push(subject_id.to_string());
        self.passwords
            .lock()
            .unwrap()
            .retain(|_, (_, identity)| identity.subject_id != subject_id);
        Ok(())
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str) -> ApiResult<String> {
        Ok(format!(
            "https://platform.test/auth/v1/authorize?provider={}&redirect_to={}",
            provider, redirect_to
        ))
    }
}

/// Upload issuer that echoes the path back
pub struct StubUploads;

#[async_trait]
impl UploadUrlIssuer for StubUploads {
    async fn create_signed_upload_url(&self, path: &str) -> ApiResult<SignedUpload> {
        Ok(SignedUpload {
            path: path.to_string(),
            signed_url: format!("https://platform.test/storage/v1/object/upload/sign/uploads/{}?token=t", path),
            token: "t".to_string(),
        })
    }
}

pub fn test_settings() -> Settings {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("PLATFORM_URL", "https://platform.test"),
        ("PLATFORM_ANON_KEY", "anon-key"),
        ("PLATFORM_SERVICE_ROLE_KEY", "service-key"),
        ("FAIL_SAFE_ADMIN_EMAIL", FAIL_SAFE_EMAIL),
        ("AUTH_REDIRECT_URL", "http://localhost:3001/auth/callback"),
    ]);
    Settings::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test settings are complete")
}

pub fn test_state(
    identity: Arc<StubIdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
) -> SharedState {
    Arc::new(AppState::new(
        &test_settings(),
        identity,
        profiles,
        Arc::new(StubUploads),
    ))
}
