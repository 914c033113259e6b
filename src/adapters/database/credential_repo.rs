use crate::adapters::database::DbPool;
use crate::adapters::database::records::{AppRecord, AppUserRecord, UserRecord};
use crate::adapters::store::CredentialStore;
use crate::domain::app::{App, AppUpdate, NewApp};
use crate::domain::user::{AppUser, NewUser, User, UserUpdate};
use crate::domain::{AppId, UserId};
use crate::error::{AppError, Result, is_unique_violation};
use async_trait::async_trait;

const USER_COLUMNS: &str = "id, email, password_hash, steam_url, photo_path, created_at";
const APP_COLUMNS: &str = "id, name, secret, link, enabled, created_at";

/// Users, apps and admin grants in PostgreSQL.
#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_user_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) { AppError::UserExists } else { AppError::Database(err) }
}

fn map_app_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("App name already exists".into())
    } else {
        AppError::Database(err)
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    #[tracing::instrument(level = "debug", skip(self, email), err)]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn list_users(&self) -> Result<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    /// # Errors
    /// Returns `AppError::UserExists` on a unique violation of `users.email`.
    #[tracing::instrument(level = "debug", skip(self, user), err)]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (email, password_hash, steam_url, photo_path)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile.steam_url)
        .bind(&user.profile.photo_path)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_conflict)?;

        Ok(record.into())
    }

    #[tracing::instrument(level = "debug", skip(self, update), err)]
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>> {
        let (steam_url, photo_path) = update.profile.map(|p| (p.steam_url, p.photo_path)).unzip();

        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users
            SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                steam_url = COALESCE($4, steam_url),
                photo_path = COALESCE($5, photo_path)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.email)
        .bind(update.password_hash)
        .bind(steam_url)
        .bind(photo_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_conflict)?;

        Ok(record.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_app_by_id(&self, id: AppId) -> Result<Option<App>> {
        let record = sqlx::query_as::<_, AppRecord>(&format!("SELECT {APP_COLUMNS} FROM apps WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn list_apps(&self) -> Result<Vec<App>> {
        let records = sqlx::query_as::<_, AppRecord>(&format!("SELECT {APP_COLUMNS} FROM apps ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(level = "debug", skip(self, app), fields(name = %app.name), err)]
    async fn create_app(&self, app: NewApp) -> Result<App> {
        let record = sqlx::query_as::<_, AppRecord>(&format!(
            r#"
            INSERT INTO apps (name, secret, link)
            VALUES ($1, $2, $3)
            RETURNING {APP_COLUMNS}
            "#
        ))
        .bind(&app.name)
        .bind(&app.secret)
        .bind(&app.link)
        .fetch_one(&self.pool)
        .await
        .map_err(map_app_conflict)?;

        Ok(record.into())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn update_app(&self, id: AppId, update: AppUpdate) -> Result<Option<App>> {
        let record = sqlx::query_as::<_, AppRecord>(&format!(
            r#"
            UPDATE apps
            SET
                name = COALESCE($2, name),
                link = COALESCE($3, link)
            WHERE id = $1
            RETURNING {APP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.link)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_app_conflict)?;

        Ok(record.map(Into::into))
    }

    /// Grants and refresh tokens of the app go with it through `ON DELETE CASCADE`.
    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn delete_app(&self, id: AppId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM apps WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn set_app_enabled(&self, id: AppId, enabled: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE apps SET enabled = $2 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn is_admin(&self, user_id: UserId, app_id: AppId) -> Result<bool> {
        let grant = sqlx::query_scalar::<_, bool>("SELECT is_admin FROM admins WHERE user_id = $1 AND app_id = $2")
            .bind(user_id)
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(grant.unwrap_or(false))
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn set_admin(&self, user_id: UserId, app_id: AppId, is_admin: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO admins (user_id, app_id, is_admin)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, app_id) DO UPDATE SET is_admin = EXCLUDED.is_admin
            "#,
        )
        .bind(user_id)
        .bind(app_id)
        .bind(is_admin)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn remove_admin(&self, user_id: UserId, app_id: AppId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admins WHERE user_id = $1 AND app_id = $2")
            .bind(user_id)
            .bind(app_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn list_users_for_app(&self, app_id: AppId) -> Result<Vec<AppUser>> {
        let records = sqlx::query_as::<_, AppUserRecord>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.steam_url, u.photo_path, u.created_at, a.is_admin
            FROM users u
            JOIN admins a ON a.user_id = u.id
            WHERE a.app_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(app_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
