use super::{AppId, UserId};
use time::OffsetDateTime;

/// A persisted refresh token. Only the SHA-256 digest of the opaque value is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token_hash: String,
    pub user_id: UserId,
    pub app_id: AppId,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl RefreshToken {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefreshToken {
    pub token_hash: String,
    pub user_id: UserId,
    pub app_id: AppId,
    pub expires_at: OffsetDateTime,
}
