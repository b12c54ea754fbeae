// rest/extract.rs — bearer-token authentication extractor.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::auth::SessionStore;
use crate::storage::UserRow;
use crate::AppContext;

use super::error::ApiError;

/// The authenticated user, resolved from the `Authorization: Bearer` header.
///
/// Handlers that take `AuthUser` reject unauthenticated requests with 401
/// before any of their own code runs.
pub struct AuthUser(pub UserRow);

impl FromRequestParts<Arc<AppContext>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::unauthorized("missing bearer token"));
        }

        let sessions = SessionStore::new(ctx.storage.pool());
        match sessions.resolve(token).await {
            Ok(Some(user)) => Ok(AuthUser(user)),
            Ok(None) => Err(ApiError::unauthorized("invalid or expired session token")),
            Err(e) => Err(ApiError::from(e)),
        }
    }
}

/// The raw bearer token, for handlers that operate on the session itself
/// (logout revokes exactly the presented token).
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();
        if token.is_empty() {
            return Err(ApiError::unauthorized("missing bearer token"));
        }
        Ok(BearerToken(token.to_string()))
    }
}
