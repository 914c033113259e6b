use crate::adapters::{CredentialStore, RefreshTokenStore};
use crate::config::AuthConfig;
use crate::domain::app::App;
use crate::domain::auth_session::AuthSession;
use crate::domain::claims::{AccessClaims, TokenValidation};
use crate::domain::refresh_token::NewRefreshToken;
use crate::domain::user::{NewUser, Profile, User};
use crate::domain::{AppId, UserId};
use crate::error::{AppError, Result};
use crate::services::bounded;
use crate::services::opaque_token::OpaqueToken;
use crate::services::password::PasswordHasher;
use crate::services::token_signer::{TokenError, TokenSigner, TokenSubject};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone, Debug)]
struct Metrics {
    login_total: Counter<u64>,
    login_failures_total: Counter<u64>,
    refresh_total: Counter<u64>,
    logout_total: Counter<u64>,
    registrations_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("tenant-sso");
        Self {
            login_total: meter
                .u64_counter("sso_login_total")
                .with_description("Total number of successful logins")
                .build(),
            login_failures_total: meter
                .u64_counter("sso_login_failures_total")
                .with_description("Total number of rejected logins and refreshes")
                .build(),
            refresh_total: meter
                .u64_counter("sso_refresh_total")
                .with_description("Total number of successful refresh token rotations")
                .build(),
            logout_total: meter
                .u64_counter("sso_logout_total")
                .with_description("Total number of refresh tokens revoked by logout")
                .build(),
            registrations_total: meter
                .u64_counter("sso_registrations_total")
                .with_description("Total number of registered users")
                .build(),
        }
    }
}

/// Login, refresh, logout and token validation over the credential and refresh token stores.
///
/// Holds no mutable state of its own; every call is independent and may run concurrently
/// with any other.
#[derive(Clone, Debug)]
pub struct SessionManager {
    credentials: Arc<dyn CredentialStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hasher: PasswordHasher,
    signer: TokenSigner,
    config: AuthConfig,
    metrics: Metrics,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        hasher: PasswordHasher,
        signer: TokenSigner,
        config: AuthConfig,
    ) -> Self {
        Self { credentials, refresh_tokens, hasher, signer, config, metrics: Metrics::new() }
    }

    /// Authenticates `email`/`password` for `app_id` and opens a session.
    ///
    /// Any previous refresh token of the same user for the same app is revoked.
    ///
    /// # Errors
    /// Returns `AppError::InvalidCredentials` for an unknown email, a wrong password, or an
    /// unknown or disabled app, without saying which.
    #[tracing::instrument(
        skip(self, email, password),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn login(&self, email: &str, password: &str, app_id: AppId) -> Result<AuthSession> {
        let timeout = self.config.store_timeout();

        let Some(user) = bounded(timeout, "find_user_by_email", self.credentials.find_user_by_email(email)).await?
        else {
            self.hasher.verify_dummy(password).await?;
            return Err(self.reject("user not found"));
        };
        tracing::Span::current().record("user_id", user.id);

        if !self.hasher.verify(password, &user.password_hash).await? {
            return Err(self.reject("invalid password"));
        }

        let Some(app) = self.active_app(app_id).await? else {
            return Err(self.reject("unknown or disabled app"));
        };

        let is_admin = bounded(timeout, "is_admin", self.credentials.is_admin(user.id, app.id)).await?;
        let (session, refresh) = self.issue_session(&user, &app, is_admin)?;

        bounded(timeout, "delete_by_owner", self.refresh_tokens.delete_by_owner(user.id, app.id)).await?;
        bounded(timeout, "create_refresh_token", self.refresh_tokens.create(&refresh)).await?;

        tracing::info!("User logged in");
        self.metrics.login_total.add(1, &[]);
        Ok(session)
    }

    /// Exchanges a refresh token for a new token pair. The presented token is single-use.
    ///
    /// # Errors
    /// Returns `AppError::InvalidCredentials` if the token is unknown, expired, already
    /// rotated, or its owner no longer resolves to a user and an enabled app.
    #[tracing::instrument(
        skip(self, refresh_token),
        fields(user_id = tracing::field::Empty, app_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession> {
        let timeout = self.config.store_timeout();
        let old_hash = OpaqueToken::hash(refresh_token);

        let Some(stored) = bounded(timeout, "find_refresh_token", self.refresh_tokens.find(&old_hash)).await? else {
            return Err(self.reject("refresh token not found"));
        };
        let span = tracing::Span::current();
        span.record("user_id", stored.user_id);
        span.record("app_id", stored.app_id);

        if stored.is_expired() {
            let deleted =
                bounded(timeout, "delete_refresh_token", self.refresh_tokens.delete_by_token(&old_hash)).await;
            if let Err(e) = deleted {
                tracing::warn!(error = %e, "Failed to delete expired refresh token");
            }
            return Err(self.reject("refresh token expired"));
        }

        let Some(user) = bounded(timeout, "find_user_by_id", self.credentials.find_user_by_id(stored.user_id)).await?
        else {
            return Err(self.reject("token owner no longer exists"));
        };
        let Some(app) = self.active_app(stored.app_id).await? else {
            return Err(self.reject("unknown or disabled app"));
        };

        let is_admin = bounded(timeout, "is_admin", self.credentials.is_admin(user.id, app.id)).await?;
        let (session, refresh) = self.issue_session(&user, &app, is_admin)?;

        bounded(timeout, "create_refresh_token", self.refresh_tokens.create(&refresh)).await?;

        match bounded(timeout, "delete_refresh_token", self.refresh_tokens.delete_by_token(&old_hash)).await {
            Ok(0) => {
                if let Err(e) =
                    bounded(timeout, "delete_refresh_token", self.refresh_tokens.delete_by_token(&refresh.token_hash))
                        .await
                {
                    tracing::error!(error = %e, "Failed to roll back refresh token of a lost rotation");
                }
                return Err(self.reject("refresh token already rotated"));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to delete rotated refresh token; it will expire on its own");
            }
        }

        tracing::info!("Tokens rotated successfully");
        self.metrics.refresh_total.add(1, &[]);
        Ok(session)
    }

    /// Revokes a refresh token. Returns whether a token was actually revoked; revoking an
    /// unknown token is not an error.
    ///
    /// # Errors
    /// Returns `AppError::Timeout` or a store error if the delete could not be carried out.
    #[tracing::instrument(skip(self, refresh_token), err)]
    pub async fn logout(&self, refresh_token: &str) -> Result<bool> {
        let hash = OpaqueToken::hash(refresh_token);
        let deleted =
            bounded(self.config.store_timeout(), "delete_refresh_token", self.refresh_tokens.delete_by_token(&hash))
                .await?;

        if deleted > 0 {
            tracing::info!("Refresh token revoked");
            self.metrics.logout_total.add(1, &[]);
        } else {
            tracing::debug!("Logout for unknown refresh token");
        }
        Ok(deleted > 0)
    }

    /// Checks an access token. Expired, tampered or foreign tokens are reported as
    /// `valid = false`.
    ///
    /// # Errors
    /// Only a failing app lookup is an error.
    #[tracing::instrument(skip(self, access_token), err)]
    pub async fn validate_token(&self, access_token: &str) -> Result<TokenValidation> {
        match self.verify_access(access_token).await {
            Ok(claims) => Ok(TokenValidation::valid(claims)),
            Err(TokenError::Lookup(e)) => Err(e),
            Err(e) => {
                tracing::debug!(reason = %e, "Access token rejected");
                Ok(TokenValidation::invalid())
            }
        }
    }

    /// Like [`Self::validate_token`] but for request authentication: any rejection is
    /// `InvalidCredentials`.
    ///
    /// # Errors
    /// Returns `AppError::InvalidCredentials` for a rejected token, or the lookup error.
    pub async fn authenticate(&self, access_token: &str) -> Result<AccessClaims> {
        self.verify_access(access_token).await.map_err(|e| match e {
            TokenError::Lookup(e) => e,
            other => {
                tracing::debug!(reason = %other, "Access token rejected");
                AppError::InvalidCredentials
            }
        })
    }

    /// Creates a user and returns its id.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` for an empty email or password and
    /// `AppError::UserExists` if the email is taken.
    #[tracing::instrument(
        skip(self, email, password, profile),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn register_new_user(&self, email: &str, password: &str, profile: Profile) -> Result<UserId> {
        if email.trim().is_empty() {
            return Err(AppError::BadRequest("Email is required".into()));
        }
        if password.is_empty() {
            return Err(AppError::BadRequest("Password is required".into()));
        }

        let password_hash = self.hasher.hash(password).await?;
        let new_user = NewUser { email: email.to_string(), password_hash, profile };
        let user = bounded(self.config.store_timeout(), "create_user", self.credentials.create_user(new_user)).await?;

        tracing::Span::current().record("user_id", user.id);
        tracing::info!("User registered successfully");
        self.metrics.registrations_total.add(1, &[]);
        Ok(user.id)
    }

    /// # Errors
    /// Store failures propagate; a missing grant is `Ok(false)`.
    #[tracing::instrument(skip(self), err)]
    pub async fn is_admin(&self, user_id: UserId, app_id: AppId) -> Result<bool> {
        bounded(self.config.store_timeout(), "is_admin", self.credentials.is_admin(user_id, app_id)).await
    }

    async fn verify_access(&self, access_token: &str) -> std::result::Result<AccessClaims, TokenError> {
        let claims = self
            .signer
            .verify(access_token, |app_id| async move {
                self.active_app(app_id).await.map(|app| app.map(|app| app.secret))
            })
            .await?;

        if claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Looks up an app, treating a disabled one as absent.
    async fn active_app(&self, app_id: AppId) -> Result<Option<App>> {
        let app =
            bounded(self.config.store_timeout(), "find_app_by_id", self.credentials.find_app_by_id(app_id)).await?;
        Ok(app.filter(|app| app.enabled))
    }

    fn issue_session(&self, user: &User, app: &App, is_admin: bool) -> Result<(AuthSession, NewRefreshToken)> {
        let subject = TokenSubject { user_id: user.id, email: &user.email, app_id: app.id, is_admin };
        let access = self.signer.issue(&subject, &app.secret, self.config.access_token_ttl())?;

        let expires_at = self
            .config
            .refresh_token_ttl()
            .and_then(|ttl| OffsetDateTime::now_utc().checked_add(ttl))
            .ok_or_else(|| {
                tracing::error!(days = self.config.refresh_token_ttl_days, "Refresh token expiry out of range");
                AppError::Internal
            })?;

        let refresh_token = OpaqueToken::generate()?;
        let record = NewRefreshToken {
            token_hash: OpaqueToken::hash(&refresh_token),
            user_id: user.id,
            app_id: app.id,
            expires_at,
        };

        Ok((AuthSession { access_token: access.token, refresh_token, expires_at: access.claims.exp }, record))
    }

    fn reject(&self, reason: &'static str) -> AppError {
        tracing::warn!(reason, "Authentication rejected");
        self.metrics.login_failures_total.add(1, &[KeyValue::new("reason", reason)]);
        AppError::InvalidCredentials
    }
}
