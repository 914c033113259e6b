use crate::domain::app::App;
use crate::domain::user::{AppUser, Profile};
use crate::domain::{AppId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApp {
    pub name: String,
    #[serde(default)]
    pub link: String,
    pub secret: Option<String>,
}

/// Returned once on creation; the only response that carries the signing secret.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCreated {
    pub id: AppId,
    pub name: String,
    pub link: String,
    pub secret: String,
}

impl From<App> for AppCreated {
    fn from(app: App) -> Self {
        Self { id: app.id, name: app.name, link: app.link, secret: app.secret }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub id: AppId,
    pub name: String,
    pub link: String,
    pub enabled: bool,
    pub created_at: i64,
}

impl From<App> for AppInfo {
    fn from(app: App) -> Self {
        Self {
            id: app.id,
            name: app.name,
            link: app.link,
            enabled: app.enabled,
            created_at: app.created_at.unix_timestamp(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    pub enabled: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApp {
    pub name: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUserInfo {
    pub id: UserId,
    pub email: String,
    pub profile: Profile,
    pub is_admin: bool,
}

impl From<AppUser> for AppUserInfo {
    fn from(member: AppUser) -> Self {
        Self { id: member.user.id, email: member.user.email, profile: member.user.profile, is_admin: member.is_admin }
    }
}
