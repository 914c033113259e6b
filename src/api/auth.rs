use crate::api::AppState;
use crate::api::schemas::auth::{
    AdminStatus, AuthSession as AuthSessionSchema, Login, Logout, Refresh, Registered, Registration, TokenStatus,
    ValidateToken,
};
use crate::domain::auth_session::AuthSession;
use crate::domain::{AppId, UserId};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

pub async fn register(State(state): State<AppState>, Json(payload): Json<Registration>) -> Result<impl IntoResponse> {
    let user_id = state.session_manager.register_new_user(&payload.email, &payload.password, payload.profile).await?;
    Ok((StatusCode::CREATED, Json(Registered { user_id })))
}

pub async fn login(State(state): State<AppState>, Json(payload): Json<Login>) -> Result<impl IntoResponse> {
    payload.validate().map_err(AppError::BadRequest)?;
    let session = state.session_manager.login(&payload.email, &payload.password, payload.app_id).await?;
    Ok(Json(map_session(session)))
}

pub async fn refresh(State(state): State<AppState>, Json(payload): Json<Refresh>) -> Result<impl IntoResponse> {
    let session = state.session_manager.refresh(&payload.refresh_token).await?;
    Ok(Json(map_session(session)))
}

/// Always 204: revoking an unknown or already revoked token is not an error.
pub async fn logout(State(state): State<AppState>, Json(payload): Json<Logout>) -> Result<impl IntoResponse> {
    state.session_manager.logout(&payload.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn validate_token(
    State(state): State<AppState>,
    Json(payload): Json<ValidateToken>,
) -> Result<impl IntoResponse> {
    let validation = state.session_manager.validate_token(&payload.access_token).await?;
    Ok(Json(TokenStatus::from(validation)))
}

pub async fn is_admin(
    State(state): State<AppState>,
    Path((app_id, user_id)): Path<(AppId, UserId)>,
) -> Result<impl IntoResponse> {
    let is_admin = state.session_manager.is_admin(user_id, app_id).await?;
    Ok(Json(AdminStatus { is_admin }))
}

fn map_session(session: AuthSession) -> AuthSessionSchema {
    AuthSessionSchema {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        expires_at: session.expires_at,
    }
}
