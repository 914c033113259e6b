use crate::domain::refresh_token::RefreshToken;
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, FromRow)]
pub struct RefreshTokenRecord {
    pub(crate) token_hash: String,
    pub(crate) user_id: i64,
    pub(crate) app_id: i64,
    pub(crate) expires_at: OffsetDateTime,
    pub(crate) created_at: OffsetDateTime,
}

impl From<RefreshTokenRecord> for RefreshToken {
    fn from(record: RefreshTokenRecord) -> Self {
        Self {
            token_hash: record.token_hash,
            user_id: record.user_id,
            app_id: record.app_id,
            expires_at: record.expires_at,
            created_at: record.created_at,
        }
    }
}
