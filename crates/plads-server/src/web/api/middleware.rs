use crate::auth::validate_access_token;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;
use uuid::Uuid;

/// Extractor that validates a JWT Bearer token and provides the
/// authenticated user's id. Only the id is attached downstream; the
/// email claim stays inside the token. Preflight OPTIONS requests are
/// handled by the CORS layer before routing and never reach this.
#[derive(Debug)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::AuthenticationFailed)?;

        let claims = validate_access_token(token, &state.config.jwt_secret)
            .map_err(|_| ApiError::AuthenticationFailed)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::AuthenticationFailed)?;
        Ok(AuthUser(user_id))
    }
}
