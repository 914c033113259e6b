use crate::api::AppState;
use crate::domain::claims::AccessClaims;
use crate::domain::{AppId, UserId};
use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// The caller behind a valid `Authorization: Bearer <access token>` header.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub app_id: AppId,
    pub claims: AccessClaims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or(AppError::InvalidCredentials)?;
        let auth_str = auth_header.to_str().map_err(|_| AppError::InvalidCredentials)?;
        let token = auth_str.strip_prefix("Bearer ").ok_or(AppError::InvalidCredentials)?;

        let claims = state.session_manager.authenticate(token).await?;
        tracing::Span::current().record("user_id", claims.uid);

        Ok(Self { user_id: claims.uid, app_id: claims.app_id, claims })
    }
}
