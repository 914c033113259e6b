use crate::adapters::database::DbPool;
use crate::adapters::database::records::RefreshTokenRecord;
use crate::adapters::store::RefreshTokenStore;
use crate::domain::refresh_token::{NewRefreshToken, RefreshToken};
use crate::domain::{AppId, UserId};
use crate::error::{AppError, Result, is_unique_violation};
use async_trait::async_trait;
use time::OffsetDateTime;

#[derive(Clone, Debug)]
pub struct PgRefreshTokenStore {
    pool: DbPool,
}

impl PgRefreshTokenStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    /// Creates a new refresh token record.
    /// Note: We store the HASH, not the raw token.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(
        level = "debug",
        skip(self, token),
        fields(user_id = token.user_id, app_id = token.app_id),
        err
    )]
    async fn create(&self, token: &NewRefreshToken) -> Result<()> {
        sqlx::query("INSERT INTO refresh_tokens (token_hash, user_id, app_id, expires_at) VALUES ($1, $2, $3, $4)")
            .bind(&token.token_hash)
            .bind(token.user_id)
            .bind(token.app_id)
            .bind(token.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Refresh token already exists".into())
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, token_hash), err)]
    async fn find(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT token_hash, user_id, app_id, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Into::into))
    }

    /// Single-statement delete; Postgres row locking guarantees only one concurrent
    /// caller observes an affected row.
    #[tracing::instrument(level = "debug", skip(self, token_hash), err)]
    async fn delete_by_token(&self, token_hash: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_by_owner(&self, user_id: UserId, app_id: AppId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1 AND app_id = $2")
            .bind(user_id)
            .bind(app_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_by_user(&self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_by_app(&self, app_id: AppId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE app_id = $1")
            .bind(app_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes all refresh tokens expired at `before`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_expired(&self, before: OffsetDateTime) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(before)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
