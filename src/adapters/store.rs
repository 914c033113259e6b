//! Persistence contracts consumed by the services.
//!
//! Lookups report absence as `Ok(None)` so callers can tell "not found" apart from
//! a failing backend. Implementations are cancel-safe: the services bound every call
//! with a timeout and drop the future when it expires.

use crate::domain::app::{App, AppUpdate, NewApp};
use crate::domain::refresh_token::{NewRefreshToken, RefreshToken};
use crate::domain::user::{AppUser, NewUser, User, UserUpdate};
use crate::domain::{AppId, UserId};
use crate::error::Result;
use async_trait::async_trait;
use time::OffsetDateTime;

#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Every user, ordered by id.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Inserts a user.
    ///
    /// # Errors
    /// Returns `AppError::UserExists` if the email is already taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Applies a partial update. Returns `Ok(None)` if the user does not exist.
    ///
    /// # Errors
    /// Returns `AppError::UserExists` if the new email belongs to another user.
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>>;

    /// Returns false if there was nothing to delete.
    async fn delete_user(&self, id: UserId) -> Result<bool>;

    async fn find_app_by_id(&self, id: AppId) -> Result<Option<App>>;

    /// Every app, enabled or not, ordered by id.
    async fn list_apps(&self) -> Result<Vec<App>>;

    /// Registers an app.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the name is already taken.
    async fn create_app(&self, app: NewApp) -> Result<App>;

    /// Applies a partial update. Returns `Ok(None)` if the app does not exist.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the new name belongs to another app.
    async fn update_app(&self, id: AppId, update: AppUpdate) -> Result<Option<App>>;

    /// Deletes the app and its admin grants. Returns false if there was nothing to delete.
    async fn delete_app(&self, id: AppId) -> Result<bool>;

    /// Returns false if the app does not exist.
    async fn set_app_enabled(&self, id: AppId, enabled: bool) -> Result<bool>;

    /// A missing grant is `Ok(false)`, never an error.
    async fn is_admin(&self, user_id: UserId, app_id: AppId) -> Result<bool>;

    async fn set_admin(&self, user_id: UserId, app_id: AppId, is_admin: bool) -> Result<()>;

    /// Returns false if no grant existed.
    async fn remove_admin(&self, user_id: UserId, app_id: AppId) -> Result<bool>;

    /// Users holding a grant record for `app_id`, ordered by user id.
    async fn list_users_for_app(&self, app_id: AppId) -> Result<Vec<AppUser>>;

    /// Cheap connectivity check used by the readiness probe.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync + std::fmt::Debug {
    async fn create(&self, token: &NewRefreshToken) -> Result<()>;

    async fn find(&self, token_hash: &str) -> Result<Option<RefreshToken>>;

    /// Deletes a single token and reports how many rows went away.
    /// Concurrent callers racing on the same token see exactly one `1`.
    async fn delete_by_token(&self, token_hash: &str) -> Result<u64>;

    async fn delete_by_owner(&self, user_id: UserId, app_id: AppId) -> Result<u64>;

    async fn delete_by_user(&self, user_id: UserId) -> Result<u64>;

    async fn delete_by_app(&self, app_id: AppId) -> Result<u64>;

    /// Bulk sweep of every token whose expiry is at or before `before`.
    async fn delete_expired(&self, before: OffsetDateTime) -> Result<u64>;
}
