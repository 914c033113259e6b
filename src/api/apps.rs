use crate::api::MgmtState;
use crate::api::schemas::apps::{AppCreated, AppInfo, AppStatus, AppUserInfo, CreateApp, UpdateApp};
use crate::domain::{AppId, UserId};
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

pub async fn create_app(State(state): State<MgmtState>, Json(payload): Json<CreateApp>) -> Result<impl IntoResponse> {
    let app = state.app_service.create_app(&payload.name, &payload.link, payload.secret).await?;
    Ok((StatusCode::CREATED, Json(AppCreated::from(app))))
}

pub async fn list_apps(State(state): State<MgmtState>) -> Result<impl IntoResponse> {
    let apps = state.app_service.list_apps().await?;
    Ok(Json(apps.into_iter().map(AppInfo::from).collect::<Vec<_>>()))
}

pub async fn get_app(State(state): State<MgmtState>, Path(app_id): Path<AppId>) -> Result<impl IntoResponse> {
    let app = state.app_service.get_app(app_id).await?;
    Ok(Json(AppInfo::from(app)))
}

pub async fn update_app(
    State(state): State<MgmtState>,
    Path(app_id): Path<AppId>,
    Json(payload): Json<UpdateApp>,
) -> Result<impl IntoResponse> {
    let app = state.app_service.update_app(app_id, payload.name, payload.link).await?;
    Ok(Json(AppInfo::from(app)))
}

pub async fn delete_app(State(state): State<MgmtState>, Path(app_id): Path<AppId>) -> Result<impl IntoResponse> {
    state.app_service.delete_app(app_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_app_users(State(state): State<MgmtState>, Path(app_id): Path<AppId>) -> Result<impl IntoResponse> {
    let users = state.app_service.list_app_users(app_id).await?;
    Ok(Json(users.into_iter().map(AppUserInfo::from).collect::<Vec<_>>()))
}

pub async fn set_status(
    State(state): State<MgmtState>,
    Path(app_id): Path<AppId>,
    Json(payload): Json<AppStatus>,
) -> Result<impl IntoResponse> {
    state.app_service.set_enabled(app_id, payload.enabled).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_admin(
    State(state): State<MgmtState>,
    Path((app_id, user_id)): Path<(AppId, UserId)>,
) -> Result<impl IntoResponse> {
    state.app_service.grant_admin(user_id, app_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_admin(
    State(state): State<MgmtState>,
    Path((app_id, user_id)): Path<(AppId, UserId)>,
) -> Result<impl IntoResponse> {
    state.app_service.revoke_admin(user_id, app_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
