//! Profile rows through the rest API (`/rest/v1/{table}`)

use super::{ensure_success, parse_json, PlatformClient};
use crate::error::{ApiResult, AppError};
use crate::profiles::{NewProfile, Profile, ProfileStore};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: String,
}

/// Profile store backed by the platform's relational API
pub struct PlatformProfiles {
    client: PlatformClient,
    table: String,
}

impl PlatformProfiles {
    pub fn new(client: PlatformClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn table_url(&self) -> String {
        self.client.url(&format!("/rest/v1/{}", self.table))
    }

    async fn select_by_id<T>(&self, subject_id: &str, columns: &str) -> ApiResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let request = self
            .client
            .http
            .get(self.table_url())
            .query(&[("id", format!("eq.{}", subject_id)), ("select", columns.to_string())]);
        let response = self.client.as_service(request).send().await?;

        parse_json(response).await
    }
}

#[async_trait]
impl ProfileStore for PlatformProfiles {
    async fn find_role_by_subject_id(&self, subject_id: &str) -> ApiResult<Option<String>> {
        let rows: Vec<RoleRow> = self.select_by_id(subject_id, "role").await?;
        Ok(rows.into_iter().next().map(|row| row.role))
    }

    async fn find_by_subject_id(&self, subject_id: &str) -> ApiResult<Option<Profile>> {
        let rows: Vec<Profile> = self.select_by_id(subject_id, "*").await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, profile: NewProfile) -> ApiResult<Profile> {
        let request = self
            .client
            .http
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&profile);
        let response = self.client.as_service(request).send().await?;

        if response.status() == StatusCode::CONFLICT {
            return Err(AppError::Conflict(format!(
                "Profile already exists for {}",
                profile.id
            )));
        }

        let rows: Vec<Profile> = parse_json(response).await?;
        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Profile insert returned no rows".to_string()))?;

        info!(subject = %created.id, "Created profile");
        Ok(created)
    }

    async fn delete(&self, subject_id: &str) -> ApiResult<()> {
        let request = self
            .client
            .http
            .delete(self.table_url())
            .query(&[("id", format!("eq.{}", subject_id))]);
        let response = self.client.as_service(request).send().await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn list(&self) -> ApiResult<Vec<Profile>> {
        let request = self
            .client
            .http
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.asc")]);
        let response = self.client.as_service(request).send().await?;

        parse_json(response).await
    }
}
