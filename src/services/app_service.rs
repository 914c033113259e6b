use crate::adapters::{CredentialStore, RefreshTokenStore};
use crate::domain::app::{App, AppUpdate, NewApp};
use crate::domain::user::AppUser;
use crate::domain::{AppId, UserId};
use crate::error::{AppError, Result};
use crate::services::bounded;
use crate::services::opaque_token::OpaqueToken;
use std::sync::Arc;
use std::time::Duration;

/// Registration and administration of client apps.
#[derive(Clone, Debug)]
pub struct AppService {
    credentials: Arc<dyn CredentialStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    store_timeout: Duration,
}

impl AppService {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        store_timeout: Duration,
    ) -> Self {
        Self { credentials, refresh_tokens, store_timeout }
    }

    /// Registers an app. Without an explicit `secret` a random 256-bit one is generated.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the name is taken and `AppError::BadRequest` for an
    /// empty name or secret.
    #[tracing::instrument(skip(self, secret), err(level = "warn"))]
    pub async fn create_app(&self, name: &str, link: &str, secret: Option<String>) -> Result<App> {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("App name is required".into()));
        }
        let secret = match secret {
            Some(s) if s.is_empty() => return Err(AppError::BadRequest("App secret must not be empty".into())),
            Some(s) => s,
            None => OpaqueToken::generate()?,
        };

        let app = NewApp { name: name.to_string(), secret, link: link.to_string() };
        let app = bounded(self.store_timeout, "create_app", self.credentials.create_app(app)).await?;

        tracing::info!(app_id = app.id, "App registered");
        Ok(app)
    }

    /// # Errors
    /// Returns `AppError::AppNotFound` if the app does not exist.
    #[tracing::instrument(skip(self), err)]
    pub async fn get_app(&self, app_id: AppId) -> Result<App> {
        bounded(self.store_timeout, "find_app_by_id", self.credentials.find_app_by_id(app_id))
            .await?
            .ok_or(AppError::AppNotFound)
    }

    /// # Errors
    /// Store failures propagate.
    #[tracing::instrument(skip(self), err)]
    pub async fn list_apps(&self) -> Result<Vec<App>> {
        bounded(self.store_timeout, "list_apps", self.credentials.list_apps()).await
    }

    /// Renames or relinks an app. The secret and status are left alone.
    ///
    /// # Errors
    /// Returns `AppError::AppNotFound` if the app does not exist, `AppError::Conflict` if
    /// the new name is taken and `AppError::BadRequest` for an empty name.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn update_app(&self, app_id: AppId, name: Option<String>, link: Option<String>) -> Result<App> {
        if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::BadRequest("App name must not be empty".into()));
        }

        let update = AppUpdate { name, link };
        if update.is_empty() {
            return self.get_app(app_id).await;
        }

        let app = bounded(self.store_timeout, "update_app", self.credentials.update_app(app_id, update))
            .await?
            .ok_or(AppError::AppNotFound)?;
        tracing::info!("App updated");
        Ok(app)
    }

    /// Deletes the app together with its admin grants and every refresh token issued
    /// for it. Access tokens already handed out stop validating with it.
    ///
    /// # Errors
    /// Returns `AppError::AppNotFound` if the app does not exist.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn delete_app(&self, app_id: AppId) -> Result<()> {
        let revoked =
            bounded(self.store_timeout, "delete_by_app", self.refresh_tokens.delete_by_app(app_id)).await?;

        if !bounded(self.store_timeout, "delete_app", self.credentials.delete_app(app_id)).await? {
            return Err(AppError::AppNotFound);
        }

        tracing::info!(revoked, "App deleted");
        Ok(())
    }

    /// Users holding a grant record for the app, with their admin flag.
    ///
    /// # Errors
    /// Returns `AppError::AppNotFound` if the app does not exist.
    #[tracing::instrument(skip(self), err)]
    pub async fn list_app_users(&self, app_id: AppId) -> Result<Vec<AppUser>> {
        self.get_app(app_id).await?;
        bounded(self.store_timeout, "list_users_for_app", self.credentials.list_users_for_app(app_id)).await
    }

    /// Disabling an app makes its tokens fail validation and blocks new sessions.
    ///
    /// # Errors
    /// Returns `AppError::AppNotFound` if the app does not exist.
    #[tracing::instrument(skip(self), err)]
    pub async fn set_enabled(&self, app_id: AppId, enabled: bool) -> Result<()> {
        let found =
            bounded(self.store_timeout, "set_app_enabled", self.credentials.set_app_enabled(app_id, enabled)).await?;
        if !found {
            return Err(AppError::AppNotFound);
        }
        tracing::info!(enabled, "App status changed");
        Ok(())
    }

    /// # Errors
    /// Returns `AppError::UserNotFound` or `AppError::AppNotFound` if either side is missing.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn grant_admin(&self, user_id: UserId, app_id: AppId) -> Result<()> {
        bounded(self.store_timeout, "find_user_by_id", self.credentials.find_user_by_id(user_id))
            .await?
            .ok_or(AppError::UserNotFound)?;
        self.get_app(app_id).await?;

        bounded(self.store_timeout, "set_admin", self.credentials.set_admin(user_id, app_id, true)).await?;
        tracing::info!("Admin granted");
        Ok(())
    }

    /// Returns whether a grant existed.
    ///
    /// # Errors
    /// Store failures propagate.
    #[tracing::instrument(skip(self), err)]
    pub async fn revoke_admin(&self, user_id: UserId, app_id: AppId) -> Result<bool> {
        bounded(self.store_timeout, "remove_admin", self.credentials.remove_admin(user_id, app_id)).await
    }
}
