//! Authentication route handlers
//!
//! Provides register, login, third-party sign-in and current-user endpoints.
//! Credentials and tokens are handled by the identity platform; these handlers
//! only forward them and attach the resolved role.

use crate::auth::{AuthContext, AuthUser, BearerToken, NewAccount, Role};
use crate::error::{validation_error, ApiResult, AppError};
use crate::profiles::NewProfile;
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::Validate;

// ============================================
// Request/Response Types
// ============================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthQuery {
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl From<&AuthContext> for UserResponse {
    fn from(context: &AuthContext) -> Self {
        Self {
            id: context.identity.subject_id.clone(),
            email: context.identity.email.clone(),
            name: context.identity.display_name().map(String::from),
            role: context.role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserResponse,
    pub session: SessionResponse,
}

#[derive(Debug, Serialize)]
pub struct OAuthStartResponse {
    pub success: bool,
    pub provider: String,
    pub url: String,
}

// ============================================
// Route Handlers
// ============================================

/// POST /api/auth/register
///
/// Create an account and its profile row. New profiles always start as `user`;
/// the role in the response is resolved, never read from the request.
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserEnvelope>)> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let identity = state
        .identity
        .create_account(NewAccount {
            email: req.email,
            password: req.password,
            display_name: req.name.clone(),
        })
        .await?;

    let profile = NewProfile::for_identity(&identity, Some(req.name));
    if let Err(e) = state.profiles.create(profile).await {
        warn!(subject = %identity.subject_id, "Profile creation failed, rolling back account: {}", e);
        rollback_registration(&state, &identity.subject_id).await;
        return Err(e);
    }

    let context = state
        .resolver
        .context_for(identity, state.profiles.as_ref())
        .await;
    info!(subject = %context.identity.subject_id, "Registered account");

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            success: true,
            user: UserResponse::from(&context),
        }),
    ))
}

/// Undo a partially created registration. Failures are logged, not surfaced:
/// the caller already gets the original error.
async fn rollback_registration(state: &SharedState, subject_id: &str) {
    if let Err(e) = state.profiles.delete(subject_id).await {
        warn!(subject = %subject_id, "Rollback: profile delete failed: {}", e);
    }
    if let Err(e) = state.identity.delete_account(subject_id).await {
        error!(subject = %subject_id, "Rollback: account delete failed, orphaned account: {}", e);
    }
}

/// POST /api/auth/login
///
/// Password sign-in through the identity platform.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let session = state
        .identity
        .sign_in_with_password(&req.email, &req.password)
        .await?;

    let context = state
        .resolver
        .context_for(session.identity, state.profiles.as_ref())
        .await;

    Ok(Json(LoginResponse {
        success: true,
        user: UserResponse::from(&context),
        session: SessionResponse {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
        },
    }))
}

/// GET /api/auth/oauth/{provider}
///
/// Returns the platform URL that starts a third-party sign-in. The redirect
/// target defaults to the configured one; an override must share its origin.
pub async fn oauth_start(
    State(state): State<SharedState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthQuery>,
) -> ApiResult<Json<OAuthStartResponse>> {
    let redirect_to = match query.redirect_to {
        Some(requested) => checked_redirect(&state.redirect_url, &requested)?,
        None => state.redirect_url.clone(),
    };

    let url = state.identity.authorize_url(&provider, &redirect_to)?;

    Ok(Json(OAuthStartResponse {
        success: true,
        provider,
        url,
    }))
}

fn checked_redirect(configured: &str, requested: &str) -> ApiResult<String> {
    let invalid = || AppError::BadRequest("Redirect target not allowed".to_string());

    let configured = url::Url::parse(configured)
        .map_err(|e| AppError::Config(format!("Invalid AUTH_REDIRECT_URL: {}", e)))?;
    let requested_url = url::Url::parse(requested).map_err(|_| invalid())?;

    if requested_url.origin() != configured.origin() {
        return Err(invalid());
    }

    Ok(requested_url.to_string())
}

/// POST /api/auth/oauth/callback
///
/// Called by the frontend with the token the platform issued at the end of a
/// third-party sign-in. Creates the profile row on first sign-in.
pub async fn oauth_callback(
    State(state): State<SharedState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<UserEnvelope>> {
    let identity = state.identity.verify(&token).await?;

    match state.profiles.find_by_subject_id(&identity.subject_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let profile = NewProfile::for_identity(&identity, None);
            match state.profiles.create(profile).await {
                Ok(_) => info!(subject = %identity.subject_id, "Created profile on first sign-in"),
                // Concurrent callback won the race
                Err(AppError::Conflict(_)) => {}
                Err(e) => warn!(subject = %identity.subject_id, "Lazy profile creation failed: {}", e),
            }
        }
        Err(e) => warn!(subject = %identity.subject_id, "Profile lookup failed on callback: {}", e),
    }

    let context = state
        .resolver
        .context_for(identity, state.profiles.as_ref())
        .await;

    Ok(Json(UserEnvelope {
        success: true,
        user: UserResponse::from(&context),
    }))
}

/// GET /api/auth/me
///
/// Current identity and resolved role.
pub async fn me(AuthUser(context): AuthUser) -> Json<UserEnvelope> {
    Json(UserEnvelope {
        success: true,
        user: UserResponse::from(&context),
    })
}
