//! File upload route handlers

use crate::auth::AuthUser;
use crate::error::{validation_error, ApiResult};
use crate::state::SharedState;
use crate::storage::{upload_path, SignedUpload};
use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    #[validate(length(min = 1, max = 255, message = "File name must be between 1 and 255 characters"))]
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct UploadUrlResponse {
    pub success: bool,
    #[serde(flatten)]
    pub upload: SignedUpload,
}

/// POST /api/storage/upload-url
///
/// Signed URL for a single upload under the caller's own prefix.
pub async fn create_upload_url(
    State(state): State<SharedState>,
    AuthUser(context): AuthUser,
    Json(req): Json<UploadUrlRequest>,
) -> ApiResult<Json<UploadUrlResponse>> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let path = upload_path(&context.identity.subject_id, &req.file_name, Utc::now());
    let upload = state.uploads.create_signed_upload_url(&path).await?;

    Ok(Json(UploadUrlResponse {
        success: true,
        upload,
    }))
}
