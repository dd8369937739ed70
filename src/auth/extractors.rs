use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo::User;
use crate::auth::role::Role;
use crate::error::ApiError;
use crate::state::AppState;

/// Pull the bearer token out of the `Authorization` header.
/// Absent header or empty token is `TokenMissing`; a non-Bearer scheme is
/// `TokenMalformed`.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::TokenMissing)?;

    let mut words = header.splitn(2, ' ');
    let scheme = words.next().unwrap_or("");
    let token = words.next().unwrap_or("").trim();

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::TokenMalformed(
            "authorization header must use the Bearer scheme".into(),
        ));
    }
    if token.is_empty() {
        return Err(ApiError::TokenMissing);
    }
    Ok(token)
}

pub(crate) fn require_role(actual: Role, required: Role) -> Result<(), ApiError> {
    if actual == required {
        Ok(())
    } else {
        Err(ApiError::InsufficientAccess(required))
    }
}

/// Authenticated identity resolved from a verified token.
///
/// The token's subject is re-resolved against the database so a token for a
/// deleted account stops working even before it expires.
pub struct CurrentUser {
    pub user: User,
    pub role: Role,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token)?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                warn!(user_id = claims.sub, "token subject no longer exists");
                ApiError::RecordNotFound {
                    entity: "user",
                    id: claims.sub,
                }
            })?;

        let role = user.role().ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "user {} has unrecognized role {}",
                user.id,
                user.role_name
            ))
        })?;

        Ok(CurrentUser { user, role })
    }
}

/// Guard for admin-only routes; rejects with 401 on role mismatch.
pub struct RequireAdmin(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if let Err(err) = require_role(current.role, Role::Admin) {
            warn!(user_id = current.user.id, role = %current.role, "admin access denied");
            return Err(err);
        }
        Ok(RequireAdmin(current))
    }
}

/// Guard for customer-only routes (rentals).
pub struct RequireCustomer(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if let Err(err) = require_role(current.role, Role::Customer) {
            warn!(user_id = current.user.id, role = %current.role, "customer access denied");
            return Err(err);
        }
        Ok(RequireCustomer(current))
    }
}
