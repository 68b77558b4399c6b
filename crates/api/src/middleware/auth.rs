//! Authentication extractors.
//!
//! Requests authenticate with a bearer token (`Authorization: Bearer <token>`)
//! resolved against the `auth_tokens` table. Token issuance happens outside
//! this service; the CLI seeds tokens for development.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::db::UserRepository;
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireUser(pub User);

/// Extractor that requires an authenticated admin user.
pub struct RequireAdmin(pub User);

/// Rejection for the auth extractors.
pub enum AuthRejection {
    /// Missing, malformed, or expired credentials.
    Unauthorized,
    /// Authenticated, but not an admin.
    Forbidden,
    /// Token lookup failed.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<User, AuthRejection> {
    let token = bearer_token(parts).ok_or(AuthRejection::Unauthorized)?;

    let user = UserRepository::new(state.pool())
        .get_by_token(token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Token lookup failed");
            AuthRejection::Internal
        })?;

    user.ok_or(AuthRejection::Unauthorized)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        if !user.is_admin {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_auth(value: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .uri("/cart")
            .header(AUTHORIZATION, value)
            .body(())
            .map(Request::into_parts)
            .unwrap_or_else(|_| unreachable!("static request is valid"));
        parts
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with_auth("Bearer abc123");
        assert_eq!(bearer_token(&parts), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_trims_whitespace() {
        let parts = parts_with_auth("Bearer   abc123  ");
        assert_eq!(bearer_token(&parts), Some("abc123"));
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let parts = parts_with_auth("Basic abc123");
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_empty_token_rejected() {
        let parts = parts_with_auth("Bearer ");
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_missing_header_rejected() {
        let (parts, ()) = Request::builder()
            .uri("/cart")
            .body(())
            .map(Request::into_parts)
            .unwrap_or_else(|_| unreachable!("static request is valid"));
        assert_eq!(bearer_token(&parts), None);
    }
}
