use crate::domain::UserId;
use crate::domain::user::{Profile, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: UserId,
    pub email: String,
    pub profile: Profile,
    pub created_at: i64,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self { id: user.id, email: user.email, profile: user.profile, created_at: user.created_at.unix_timestamp() }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile: Option<Profile>,
}
