use crate::domain::user::{AppUser, Profile, User};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(FromRow)]
pub struct UserRecord {
    pub(crate) id: i64,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) steam_url: String,
    pub(crate) photo_path: String,
    pub(crate) created_at: OffsetDateTime,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord").field("id", &self.id).field("email", &self.email).finish_non_exhaustive()
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            password_hash: record.password_hash,
            profile: Profile { steam_url: record.steam_url, photo_path: record.photo_path },
            created_at: record.created_at,
        }
    }
}

/// A `users` row joined with its `admins` grant for one app.
#[derive(Debug, FromRow)]
pub struct AppUserRecord {
    #[sqlx(flatten)]
    pub(crate) user: UserRecord,
    pub(crate) is_admin: bool,
}

impl From<AppUserRecord> for AppUser {
    fn from(record: AppUserRecord) -> Self {
        Self { user: record.user.into(), is_admin: record.is_admin }
    }
}
