use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::{
    error::AppError,
    state::AppState,
    users::{
        repo,
        repo_types::{User, UserRole},
    },
};

/// Authenticated, active user resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    /// Fails with 403 unless the user holds one of `roles`.
    pub fn require(&self, roles: &[UserRole]) -> Result<(), AppError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            warn!(user_id = self.0.id, role = ?self.0.role, "permission denied");
            Err(AppError::Forbidden)
        }
    }

    pub fn require_staff_manager(&self) -> Result<(), AppError> {
        self.require(&[UserRole::Admin, UserRole::Manager])
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require(&[UserRole::Admin])
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_access(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::unauthorized("Invalid or expired token")
        })?;

        let user = repo::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        if !user.is_active() {
            warn!(user_id = user.id, status = %user.status, "inactive user rejected");
            return Err(AppError::unauthorized("User is not active"));
        }

        Ok(CurrentUser(user))
    }
}
