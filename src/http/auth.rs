use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::app::auth::AuthService;
use crate::config::roles::{has_right, Right};
use crate::domain::user::Role;
use crate::http::AppError;
use crate::AppState;

/// Authenticated actor resolved from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn has(&self, right: Right) -> bool {
        has_right(self.role, right)
    }

    pub fn require(&self, right: Right) -> Result<(), AppError> {
        if self.has(right) {
            Ok(())
        } else {
            Err(AppError::forbidden("Forbidden"))
        }
    }

    /// Account owners act on themselves; `manageUsers` holders on anyone.
    pub fn require_account_access(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.user_id == user_id || self.has(Right::ManageUsers) {
            Ok(())
        } else {
            Err(AppError::forbidden("cannot modify other users"))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::bad_request("logged-in user not found"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))?;

        let service = AuthService::new(
            state.store.clone(),
            state.paseto_access_key,
            state.access_ttl_minutes,
        );
        let session = service.authenticate_access_token(token).map_err(|err| {
            tracing::error!(error = ?err, "failed to authenticate");
            AppError::internal("failed to authenticate")
        })?;

        let session = session.ok_or_else(|| AppError::unauthorized("invalid token"))?;
        Ok(AuthUser {
            user_id: session.user_id,
            role: session.role,
        })
    }
}
