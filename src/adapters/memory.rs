//! Process-local stores backed by `DashMap`.
//!
//! Used for embedding the services without a database and by the test suite.

use crate::adapters::store::{CredentialStore, RefreshTokenStore};
use crate::domain::app::{App, AppUpdate, NewApp};
use crate::domain::refresh_token::{NewRefreshToken, RefreshToken};
use crate::domain::user::{AppUser, NewUser, User, UserUpdate};
use crate::domain::{AppId, UserId};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, Ordering};
use time::OffsetDateTime;

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
    apps: DashMap<AppId, App>,
    app_names: DashMap<String, AppId>,
    admins: DashMap<(UserId, AppId), bool>,
    next_user_id: AtomicI64,
    next_app_id: AtomicI64,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::UserExists),
            Entry::Vacant(slot) => {
                let id = self.next_user_id.fetch_add(1, Ordering::Relaxed) + 1;
                let record = User {
                    id,
                    email: user.email,
                    password_hash: user.password_hash,
                    profile: user.profile,
                    created_at: OffsetDateTime::now_utc(),
                };
                self.users.insert(id, record.clone());
                slot.insert(id);
                Ok(record)
            }
        }
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>> {
        let Some(mut current) = self.users.get(&id).map(|u| u.clone()) else {
            return Ok(None);
        };

        if let Some(email) = update.email
            && email != current.email
        {
            match self.emails.entry(email.clone()) {
                Entry::Occupied(_) => return Err(AppError::UserExists),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove(&current.email);
            current.email = email;
        }
        if let Some(password_hash) = update.password_hash {
            current.password_hash = password_hash;
        }
        if let Some(profile) = update.profile {
            current.profile = profile;
        }

        self.users.insert(id, current.clone());
        Ok(Some(current))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let Some((_, user)) = self.users.remove(&id) else {
            return Ok(false);
        };
        self.emails.remove(&user.email);
        self.admins.retain(|(user_id, _), _| *user_id != id);
        Ok(true)
    }

    async fn find_app_by_id(&self, id: AppId) -> Result<Option<App>> {
        Ok(self.apps.get(&id).map(|a| a.clone()))
    }

    async fn list_apps(&self) -> Result<Vec<App>> {
        let mut apps: Vec<App> = self.apps.iter().map(|a| a.value().clone()).collect();
        apps.sort_by_key(|a| a.id);
        Ok(apps)
    }

    async fn create_app(&self, app: NewApp) -> Result<App> {
        match self.app_names.entry(app.name.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("App name already exists".into())),
            Entry::Vacant(slot) => {
                let id = self.next_app_id.fetch_add(1, Ordering::Relaxed) + 1;
                let record = App {
                    id,
                    name: app.name,
                    secret: app.secret,
                    link: app.link,
                    enabled: true,
                    created_at: OffsetDateTime::now_utc(),
                };
                self.apps.insert(id, record.clone());
                slot.insert(id);
                Ok(record)
            }
        }
    }

    async fn update_app(&self, id: AppId, update: AppUpdate) -> Result<Option<App>> {
        let Some(mut current) = self.apps.get(&id).map(|a| a.clone()) else {
            return Ok(None);
        };

        if let Some(name) = update.name
            && name != current.name
        {
            match self.app_names.entry(name.clone()) {
                Entry::Occupied(_) => return Err(AppError::Conflict("App name already exists".into())),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.app_names.remove(&current.name);
            current.name = name;
        }
        if let Some(link) = update.link {
            current.link = link;
        }

        self.apps.insert(id, current.clone());
        Ok(Some(current))
    }

    async fn delete_app(&self, id: AppId) -> Result<bool> {
        let Some((_, app)) = self.apps.remove(&id) else {
            return Ok(false);
        };
        self.app_names.remove(&app.name);
        self.admins.retain(|(_, app_id), _| *app_id != id);
        Ok(true)
    }

    async fn set_app_enabled(&self, id: AppId, enabled: bool) -> Result<bool> {
        Ok(self.apps.get_mut(&id).map(|mut app| app.enabled = enabled).is_some())
    }

    async fn is_admin(&self, user_id: UserId, app_id: AppId) -> Result<bool> {
        Ok(self.admins.get(&(user_id, app_id)).is_some_and(|grant| *grant))
    }

    async fn set_admin(&self, user_id: UserId, app_id: AppId, is_admin: bool) -> Result<()> {
        self.admins.insert((user_id, app_id), is_admin);
        Ok(())
    }

    async fn remove_admin(&self, user_id: UserId, app_id: AppId) -> Result<bool> {
        Ok(self.admins.remove(&(user_id, app_id)).is_some())
    }

    async fn list_users_for_app(&self, app_id: AppId) -> Result<Vec<AppUser>> {
        let mut members: Vec<AppUser> = self
            .admins
            .iter()
            .filter(|grant| grant.key().1 == app_id)
            .filter_map(|grant| {
                let user = self.users.get(&grant.key().0)?.clone();
                Some(AppUser { user, is_admin: *grant.value() })
            })
            .collect();
        members.sort_by_key(|m| m.user.id);
        Ok(members)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: DashMap<String, RefreshToken>,
}

impl InMemoryRefreshTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens, live or expired.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn delete_where(&self, mut predicate: impl FnMut(&RefreshToken) -> bool) -> u64 {
        let mut removed = 0;
        self.tokens.retain(|_, token| {
            let matched = predicate(token);
            if matched {
                removed += 1;
            }
            !matched
        });
        removed
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn create(&self, token: &NewRefreshToken) -> Result<()> {
        match self.tokens.entry(token.token_hash.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("Refresh token already exists".into())),
            Entry::Vacant(slot) => {
                slot.insert(RefreshToken {
                    token_hash: token.token_hash.clone(),
                    user_id: token.user_id,
                    app_id: token.app_id,
                    expires_at: token.expires_at,
                    created_at: OffsetDateTime::now_utc(),
                });
                Ok(())
            }
        }
    }

    async fn find(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        Ok(self.tokens.get(token_hash).map(|t| t.clone()))
    }

    async fn delete_by_token(&self, token_hash: &str) -> Result<u64> {
        Ok(u64::from(self.tokens.remove(token_hash).is_some()))
    }

    async fn delete_by_owner(&self, user_id: UserId, app_id: AppId) -> Result<u64> {
        Ok(self.delete_where(|t| t.user_id == user_id && t.app_id == app_id))
    }

    async fn delete_by_user(&self, user_id: UserId) -> Result<u64> {
        Ok(self.delete_where(|t| t.user_id == user_id))
    }

    async fn delete_by_app(&self, app_id: AppId) -> Result<u64> {
        Ok(self.delete_where(|t| t.app_id == app_id))
    }

    async fn delete_expired(&self, before: OffsetDateTime) -> Result<u64> {
        Ok(self.delete_where(|t| t.is_expired_at(before)))
    }
}
