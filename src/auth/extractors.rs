//! Authentication extractors for Axum
//!
//! Account registration and login live in an external service; this side
//! only verifies the JWT it issued and checks the admin allowlist.

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use super::models::Claims;
use crate::common::{ApiError, AppState};

/// Authenticated administrator extractor.
///
/// Validates the Bearer JWT and requires the claimed email to be in the
/// ADMIN_EMAILS allowlist.
#[derive(Debug)]
pub struct AuthedAdmin {
    pub id: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let token = match token {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = if let Some(rest) = token.strip_prefix("Bearer ") {
            rest.to_string()
        } else {
            token
        };

        let decoded = match decode::<Claims>(
            &bare_token,
            &DecodingKey::from_secret(app_state.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        ) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "JWT token validation failed");
                return Err(ApiError::Unauthorized("invalid token".into()));
            }
        };

        let claims = decoded.claims;
        let email_lower = claims.email.to_lowercase();

        if !app_state.admin_emails.contains(&email_lower) {
            warn!(user_id = %claims.sub, "Authorization failed: not an admin account");
            return Err(ApiError::Forbidden("admin access required".into()));
        }

        Ok(AuthedAdmin {
            id: claims.sub,
            email: claims.email,
        })
    }
}
