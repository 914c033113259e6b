#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::database::{DbPool, PgCredentialStore, PgRefreshTokenStore};
use crate::adapters::{CredentialStore, RefreshTokenStore};
use crate::api::{AppState, MgmtState};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::app_service::AppService;
use crate::services::health_service::HealthService;
use crate::services::password::PasswordHasher;
use crate::services::session_manager::SessionManager;
use crate::services::token_signer::TokenSigner;
use crate::services::user_service::UserService;
use crate::workers::RefreshTokenSweeper;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Every service the routers need, wired over the same pair of stores.
#[derive(Clone, Debug)]
pub struct ServiceContainer {
    pub session_manager: SessionManager,
    pub user_service: UserService,
    pub app_service: AppService,
    pub health_service: HealthService,
}

impl ServiceContainer {
    #[must_use]
    pub fn app_state(&self) -> AppState {
        AppState { session_manager: self.session_manager.clone(), user_service: self.user_service.clone() }
    }

    #[must_use]
    pub fn mgmt_state(&self) -> MgmtState {
        MgmtState {
            health_service: self.health_service.clone(),
            app_service: self.app_service.clone(),
            user_service: self.user_service.clone(),
        }
    }
}

/// Background tasks, spawned once the servers are ready.
#[derive(Debug)]
pub struct Workers {
    sweeper: RefreshTokenSweeper,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        vec![tokio::spawn(self.sweeper.run(shutdown_rx))]
    }
}

#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub workers: Workers,
}

/// Assembles the services and workers from configuration and a store backend.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    credentials: Option<Arc<dyn CredentialStore>>,
    refresh_tokens: Option<Arc<dyn RefreshTokenStore>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, credentials: None, refresh_tokens: None }
    }

    /// Backs both stores with PostgreSQL.
    #[must_use]
    pub fn with_database(self, pool: DbPool) -> Self {
        self.with_stores(Arc::new(PgCredentialStore::new(pool.clone())), Arc::new(PgRefreshTokenStore::new(pool)))
    }

    #[must_use]
    pub fn with_stores(
        mut self,
        credentials: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        self.credentials = Some(credentials);
        self.refresh_tokens = Some(refresh_tokens);
        self
    }

    /// # Errors
    /// Returns `AppError::Internal` if no stores were supplied or the password parameters
    /// are invalid.
    pub fn build(self) -> Result<App> {
        let (Some(credentials), Some(refresh_tokens)) = (self.credentials, self.refresh_tokens) else {
            tracing::error!("AppBuilder requires a credential store and a refresh token store");
            return Err(AppError::Internal);
        };

        let store_timeout = self.config.auth.store_timeout();
        let hasher = PasswordHasher::new(&self.config.password)?;

        let session_manager = SessionManager::new(
            Arc::clone(&credentials),
            Arc::clone(&refresh_tokens),
            hasher.clone(),
            TokenSigner::new(),
            self.config.auth.clone(),
        );
        let user_service =
            UserService::new(Arc::clone(&credentials), Arc::clone(&refresh_tokens), hasher, store_timeout);
        let app_service = AppService::new(Arc::clone(&credentials), Arc::clone(&refresh_tokens), store_timeout);
        let health_service = HealthService::new(credentials, store_timeout);

        let sweeper = RefreshTokenSweeper::new(
            refresh_tokens,
            Duration::from_secs(self.config.sweeper.interval_secs),
            store_timeout,
        );

        Ok(App {
            services: ServiceContainer { session_manager, user_service, app_service, health_service },
            workers: Workers { sweeper },
        })
    }
}

/// Applies the embedded migrations.
///
/// # Errors
/// Returns an error if a migration fails.
pub async fn run_migrations(pool: &DbPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}

/// Flips `shutdown_tx` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
            () = terminate => tracing::info!("Received SIGTERM, shutting down..."),
        }

        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the structured log.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();

        tracing::error!(panic.location = %location, panic.payload = %payload, "Panic occurred");
    }));
}
