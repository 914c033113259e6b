use crate::api::{AppState, MgmtState};
use crate::api::middleware::AuthUser;
use crate::api::schemas::users::{UpdateUser, UserInfo};
use crate::error::Result;
use crate::services::user_service::ProfileChange;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

pub async fn me(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let user = state.user_service.user_info(auth_user.user_id).await?;
    Ok(Json(UserInfo::from(user)))
}

pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateUser>,
) -> Result<impl IntoResponse> {
    let change = ProfileChange { email: payload.email, password: payload.password, profile: payload.profile };
    let user = state.user_service.update_user(auth_user.user_id, change).await?;
    Ok(Json(UserInfo::from(user)))
}

pub async fn delete_me(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.user_service.delete_user(auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(State(state): State<MgmtState>) -> Result<impl IntoResponse> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users.into_iter().map(UserInfo::from).collect::<Vec<_>>()))
}
