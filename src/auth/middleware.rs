//! Authentication extractors
//!
//! Verifies the bearer token with the identity platform and hands handlers an
//! explicit `AuthContext` instead of stashing claims in request extensions.

use super::{AuthContext, Role};
use crate::error::{unauthorized, ApiResult, AppError};
use crate::state::{AppState, SharedState};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

/// Verify `token` and resolve the caller's role
pub async fn authenticate(state: &AppState, token: &str) -> ApiResult<AuthContext> {
    let identity = state.identity.verify(token).await?;
    Ok(state.resolver.context_for(identity, state.profiles.as_ref()).await)
}

/// Raw bearer token from the `Authorization` header, not yet verified
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        unauthorized("Missing authorization header")
                    } else {
                        unauthorized("Invalid authorization format")
                    }
                })?;

        let token = bearer.token().trim();
        if token.is_empty() {
            return Err(unauthorized("Empty bearer token"));
        }

        Ok(BearerToken(token.to_string()))
    }
}

/// Require specific role
pub fn require_role(context: &AuthContext, required: Role) -> ApiResult<()> {
    let has_permission = match required {
        Role::User => true,
        Role::Admin => context.is_admin(),
    };

    if !has_permission {
        return Err(AppError::Forbidden(format!(
            "Requires {} role, you have {}",
            required, context.role
        )));
    }

    Ok(())
}

/// Any caller with a valid identity
pub struct AuthUser(pub AuthContext);

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let context = authenticate(state, &token).await?;
        Ok(AuthUser(context))
    }
}

/// Callers whose resolved role is `admin`. Rejects with 403 otherwise.
pub struct RequireAdmin(pub AuthContext);

impl FromRequestParts<SharedState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(context) = AuthUser::from_request_parts(parts, state).await?;
        require_role(&context, Role::Admin)?;
        Ok(RequireAdmin(context))
    }
}
