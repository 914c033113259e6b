use crate::adapters::RefreshTokenStore;
use crate::error::Result;
use crate::services::bounded;
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    runs_total: Counter<u64>,
    tokens_deleted_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("tenant-sso");
        Self {
            runs_total: meter
                .u64_counter("sso_sweeper_runs_total")
                .with_description("Total number of expired refresh token sweeps")
                .build(),
            tokens_deleted_total: meter
                .u64_counter("sso_sweeper_tokens_deleted_total")
                .with_description("Total number of expired refresh tokens purged by the sweeper")
                .build(),
        }
    }
}

/// Periodically purges expired refresh tokens.
///
/// Refresh already rejects expired tokens on use, so a missed sweep only lets dead rows
/// linger a little longer.
#[derive(Debug)]
pub struct RefreshTokenSweeper {
    store: Arc<dyn RefreshTokenStore>,
    interval: Duration,
    store_timeout: Duration,
    metrics: Metrics,
}

impl RefreshTokenSweeper {
    #[must_use]
    pub fn new(store: Arc<dyn RefreshTokenStore>, interval: Duration, store_timeout: Duration) -> Self {
        Self { store, interval, store_timeout, metrics: Metrics::new() }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.interval.is_zero() {
            tracing::info!("Refresh token sweeper is disabled (interval = 0)");
            return;
        }

        let mut interval = tokio::time::interval(self.interval);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.perform_sweep()
                        .instrument(tracing::info_span!("run_refresh_token_sweep"))
                        .await
                    {
                        tracing::error!(error = %e, "Refresh token sweep failed");
                    }
                }
                res = shutdown.changed() => {
                    if res.is_err() {
                        tracing::debug!("Shutdown sender dropped");
                        break;
                    }
                }
            }
        }
        tracing::info!("Refresh token sweeper shutting down...");
    }

    /// Deletes every refresh token that has expired by now and returns how many went away.
    ///
    /// # Errors
    /// Returns `AppError::Timeout` or the store error if the delete fails.
    #[tracing::instrument(skip(self), err, fields(expired_deleted = tracing::field::Empty))]
    pub async fn perform_sweep(&self) -> Result<u64> {
        tracing::debug!("Running refresh token sweep...");
        self.metrics.runs_total.add(1, &[]);

        let count =
            bounded(self.store_timeout, "delete_expired", self.store.delete_expired(OffsetDateTime::now_utc())).await?;

        if count > 0 {
            tracing::info!(count, "Deleted expired refresh tokens");
            tracing::Span::current().record("expired_deleted", count);
            self.metrics.tokens_deleted_total.add(count, &[]);
        }
        Ok(count)
    }
}
