use crate::adapters::{CredentialStore, RefreshTokenStore};
use crate::domain::UserId;
use crate::domain::user::{Profile, User, UserUpdate};
use crate::error::{AppError, Result};
use crate::services::bounded;
use crate::services::password::PasswordHasher;
use std::sync::Arc;
use std::time::Duration;

/// Changes requested by the account owner. The password arrives in plain text and is
/// hashed here.
#[derive(Default)]
pub struct ProfileChange {
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile: Option<Profile>,
}

impl std::fmt::Debug for ProfileChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileChange")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("profile", &self.profile)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct UserService {
    credentials: Arc<dyn CredentialStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hasher: PasswordHasher,
    store_timeout: Duration,
}

impl UserService {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        hasher: PasswordHasher,
        store_timeout: Duration,
    ) -> Self {
        Self { credentials, refresh_tokens, hasher, store_timeout }
    }

    /// # Errors
    /// Returns `AppError::UserNotFound` if the user does not exist.
    #[tracing::instrument(skip(self), err)]
    pub async fn user_info(&self, user_id: UserId) -> Result<User> {
        bounded(self.store_timeout, "find_user_by_id", self.credentials.find_user_by_id(user_id))
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// # Errors
    /// Store failures propagate.
    #[tracing::instrument(skip(self), err)]
    pub async fn list_users(&self) -> Result<Vec<User>> {
        bounded(self.store_timeout, "list_users", self.credentials.list_users()).await
    }

    /// Applies a partial update. A new password signs the user out of every app.
    ///
    /// # Errors
    /// Returns `AppError::UserNotFound` if the user does not exist, `AppError::UserExists`
    /// if the new email is taken and `AppError::BadRequest` for empty values.
    #[tracing::instrument(skip(self, change), err(level = "warn"))]
    pub async fn update_user(&self, user_id: UserId, change: ProfileChange) -> Result<User> {
        if change.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
            return Err(AppError::BadRequest("Email must not be empty".into()));
        }
        if change.password.as_deref().is_some_and(str::is_empty) {
            return Err(AppError::BadRequest("Password must not be empty".into()));
        }

        let password_hash = match change.password.as_deref() {
            Some(password) => Some(self.hasher.hash(password).await?),
            None => None,
        };
        let password_changed = password_hash.is_some();

        let update = UserUpdate { email: change.email, password_hash, profile: change.profile };
        if update.is_empty() {
            return self.user_info(user_id).await;
        }

        let user = bounded(self.store_timeout, "update_user", self.credentials.update_user(user_id, update))
            .await?
            .ok_or(AppError::UserNotFound)?;

        if password_changed {
            let revoked =
                bounded(self.store_timeout, "delete_by_user", self.refresh_tokens.delete_by_user(user_id)).await?;
            tracing::info!(revoked, "Password changed; refresh tokens revoked");
        }

        Ok(user)
    }

    /// Deletes the user together with every refresh token they hold.
    ///
    /// # Errors
    /// Returns `AppError::UserNotFound` if the user does not exist.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn delete_user(&self, user_id: UserId) -> Result<()> {
        bounded(self.store_timeout, "delete_by_user", self.refresh_tokens.delete_by_user(user_id)).await?;

        if !bounded(self.store_timeout, "delete_user", self.credentials.delete_user(user_id)).await? {
            return Err(AppError::UserNotFound);
        }

        tracing::info!("User deleted");
        Ok(())
    }
}
