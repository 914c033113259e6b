use crate::adapters::CredentialStore;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
struct Metrics {
    status: Gauge<i64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("tenant-sso");
        Self {
            status: meter
                .i64_gauge("sso_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    credentials: Arc<dyn CredentialStore>,
    store_timeout: Duration,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialStore>, store_timeout: Duration) -> Self {
        Self { credentials, store_timeout, metrics: Metrics::new() }
    }

    /// Checks that the credential store answers.
    ///
    /// # Errors
    /// Returns a string describing the failure if the store is unreachable.
    pub async fn check_store(&self) -> Result<(), String> {
        let component = [KeyValue::new("component", "store")];

        match timeout(self.store_timeout, self.credentials.ping()).await {
            Ok(Ok(())) => {
                self.metrics.status.record(1, &component);
                Ok(())
            }
            Ok(Err(e)) => {
                self.metrics.status.record(0, &component);
                Err(format!("Store check failed: {e}"))
            }
            Err(_) => {
                self.metrics.status.record(0, &component);
                Err("Store check timed out".to_string())
            }
        }
    }
}
