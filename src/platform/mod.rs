//! Hosted backend platform clients
//!
//! The identity, relational and storage APIs all live under one base URL:
//! - `/auth/v1`    - accounts, sessions, token verification, OAuth
//! - `/rest/v1`    - table access (profiles)
//! - `/storage/v1` - object storage
//!
//! Every call sends the project `apikey` header. Calls made on behalf of the
//! service itself use the service-role key as bearer; calls made on behalf of
//! a caller forward that caller's token.

mod identity;
mod profiles;
mod storage;

pub use identity::PlatformIdentity;
pub use profiles::PlatformProfiles;
pub use storage::PlatformStorage;

use crate::config::PlatformConfig;
use crate::error::{ApiResult, AppError};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Shared HTTP client for the platform. Cheap to clone.
#[derive(Clone)]
pub struct PlatformClient {
    http: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl PlatformClient {
    pub fn new(config: &PlatformConfig) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(
            http,
            &config.url,
            &config.anon_key,
            &config.service_role_key,
        ))
    }

    pub fn with_client(http: Client, base_url: &str, anon_key: &str, service_role_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            service_role_key: service_role_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request authorized as the calling user
    fn as_caller(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    /// Request authorized with the project's public key only
    fn as_anon(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Request authorized as the service (bypasses row-level security)
    fn as_service(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }
}

/// Decode a success body, or turn a failure status into `AppError::Upstream`
async fn parse_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

async fn ensure_success(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!("Platform error body ({}): {}", status, body);

    Err(AppError::Upstream {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Best-effort human message from a platform error body.
///
/// The auth API answers `{"msg": ..}` or `{"error_description": ..}`, the rest
/// and storage APIs answer `{"message": ..}`.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        })
        .map(String::from)
        .unwrap_or_else(|| {
            if body.is_empty() {
                "empty response".to_string()
            } else {
                body.to_string()
            }
        })
}

#[cfg(test)]
pub(crate) fn test_client(base_url: &str) -> PlatformClient {
    PlatformClient::with_client(Client::new(), base_url, "anon-key", "service-key")
}
