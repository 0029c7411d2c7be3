//! Signed upload URLs
//!
//! Objects are written directly to the platform's object store. This service
//! only picks the destination path and asks the store for a short-lived URL.

use crate::error::ApiResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid file name pattern"));

/// Signed upload ticket returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub path: String,
    pub signed_url: String,
    pub token: String,
}

#[async_trait]
pub trait UploadUrlIssuer: Send + Sync {
    async fn create_signed_upload_url(&self, path: &str) -> ApiResult<SignedUpload>;
}

/// Destination path for an upload: `{subject_id}/{unix_millis}-{file_name}`.
///
/// The subject prefix scopes the object to its owner and the timestamp keeps
/// repeated uploads of the same name apart.
pub fn upload_path(subject_id: &str, file_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}-{}",
        subject_id,
        now.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Strip directories and anything outside `[A-Za-z0-9._-]`
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned = UNSAFE_FILE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
