//! Object storage API client (`/storage/v1`)

use super::{parse_json, PlatformClient};
use crate::error::{ApiResult, AppError};
use crate::storage::{SignedUpload, UploadUrlIssuer};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Body of a signed upload URL response.
///
/// `url` is relative to the storage API root and carries the token in its
/// query string; newer deployments also return the token separately.
#[derive(Debug, Deserialize)]
struct SignUploadResponse {
    url: String,
    #[serde(default)]
    token: Option<String>,
}

/// Signed upload URLs for a single bucket
pub struct PlatformStorage {
    client: PlatformClient,
    bucket: String,
}

impl PlatformStorage {
    pub fn new(client: PlatformClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl UploadUrlIssuer for PlatformStorage {
    async fn create_signed_upload_url(&self, path: &str) -> ApiResult<SignedUpload> {
        let endpoint = self.client.url(&format!(
            "/storage/v1/object/upload/sign/{}/{}",
            self.bucket, path
        ));
        let request = self.client.http.post(endpoint).json(&json!({}));
        let response = self.client.as_service(request).send().await?;

        let signed: SignUploadResponse = parse_json(response).await?;
        let signed_url = format!("{}/storage/v1{}", self.client.base_url(), signed.url);

        let token = match signed.token {
            Some(token) => token,
            None => token_from_url(&signed_url)?,
        };

        debug!(path = %path, "Issued signed upload URL");
        Ok(SignedUpload {
            path: path.to_string(),
            signed_url,
            token,
        })
    }
}

fn token_from_url(signed_url: &str) -> ApiResult<String> {
    let parsed = url::Url::parse(signed_url)
        .map_err(|e| AppError::Internal(format!("Malformed signed URL: {}", e)))?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| AppError::Internal("Signed URL carries no token".to_string()))
}
