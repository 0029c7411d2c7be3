//! Identity API client (`/auth/v1`)

use super::{ensure_success, error_message, parse_json, PlatformClient};
use crate::auth::{Identity, IdentityProvider, NewAccount, Session};
use crate::error::{unauthorized, ApiResult, AppError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// User object as returned by the identity API
#[derive(Debug, Deserialize)]
struct PlatformUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl From<PlatformUser> for Identity {
    fn from(user: PlatformUser) -> Self {
        let mut identity = Identity::new(user.id, user.email.unwrap_or_default());
        identity.metadata = user.user_metadata;
        identity
    }
}

#[derive(Debug, Serialize)]
struct CreateUserRequest<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    user_metadata: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
    user: PlatformUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Identity provider backed by the platform's auth API
pub struct PlatformIdentity {
    client: PlatformClient,
}

impl PlatformIdentity {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityProvider for PlatformIdentity {
    async fn verify(&self, token: &str) -> ApiResult<Identity> {
        let request = self.client.http.get(self.client.url("/auth/v1/user"));
        let response = self.client.as_caller(request, token).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Token rejected by identity platform");
                Err(unauthorized("Invalid or expired token"))
            }
            _ => {
                let user: PlatformUser = parse_json(response).await?;
                Ok(user.into())
            }
        }
    }

    async fn create_account(&self, account: NewAccount) -> ApiResult<Identity> {
        let body = CreateUserRequest {
            email: &account.email,
            password: &account.password,
            email_confirm: true,
            user_metadata: json!({ "name": account.display_name }),
        };

        let request = self
            .client
            .http
            .post(self.client.url("/auth/v1/admin/users"))
            .json(&body);
        let response = self.client.as_service(request).send().await?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            let message = error_message(&response.text().await.unwrap_or_default());
            if status == StatusCode::CONFLICT || message.contains("already") {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
            return Err(AppError::Validation(message));
        }

        let user: PlatformUser = parse_json(response).await?;
        info!(subject = %user.id, "Created account");
        Ok(user.into())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<Session> {
        let request = self
            .client
            .http
            .post(self.client.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .json(&PasswordGrantRequest { email, password });
        let response = self.client.as_anon(request).send().await?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            return Err(unauthorized("Invalid email or password"));
        }

        let tokens: TokenResponse = parse_json(response).await?;
        Ok(Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
            identity: tokens.user.into(),
        })
    }

    async fn delete_account(&self, subject_id: &str) -> ApiResult<()> {
        let request = self
            .client
            .http
            .delete(self.client.url(&format!("/auth/v1/admin/users/{}", subject_id)));
        let response = self.client.as_service(request).send().await?;

        ensure_success(response).await?;
        info!(subject = %subject_id, "Deleted account");
        Ok(())
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str) -> ApiResult<String> {
        let valid = !provider.is_empty()
            && provider
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::BadRequest(format!("Unsupported provider: {}", provider)));
        }

        let url = url::Url::parse_with_params(
            &self.client.url("/auth/v1/authorize"),
            &[("provider", provider), ("redirect_to", redirect_to)],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build authorize URL: {}", e)))?;

        Ok(url.to_string())
    }
}
