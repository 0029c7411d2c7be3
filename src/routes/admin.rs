//! Admin-only route handlers

use crate::auth::{RequireAdmin, Role};
use crate::error::ApiResult;
use crate::profiles::Profile;
use crate::state::SharedState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            role: profile.role(),
            id: profile.id,
            email: profile.email,
            display_name: profile.display_name,
            created_at: profile.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfilesListResponse {
    pub success: bool,
    pub profiles: Vec<ProfileResponse>,
}

/// GET /api/admin/profiles
///
/// List all profiles (Admin only).
pub async fn list_profiles(
    State(state): State<SharedState>,
    RequireAdmin(admin): RequireAdmin,
) -> ApiResult<Json<ProfilesListResponse>> {
    let profiles = state.profiles.list().await?;
    info!(admin = %admin.identity.subject_id, count = profiles.len(), "Listed profiles");

    Ok(Json(ProfilesListResponse {
        success: true,
        profiles: profiles.into_iter().map(ProfileResponse::from).collect(),
    }))
}
