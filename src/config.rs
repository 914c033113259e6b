use clap::{Args, Parser, ValueEnum};
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub password: PasswordConfig,

    #[command(flatten)]
    pub sweeper: SweeperConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long = "database-url", env = "SSO_DATABASE_URL")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "SSO_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub max_connections: u32,

    /// Minimum number of idle connections kept open
    #[arg(long, env = "SSO_DB_MIN_CONNECTIONS", default_value_t = 2)]
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    #[arg(long, env = "SSO_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// Seconds before an idle connection is closed
    #[arg(long, env = "SSO_DB_IDLE_TIMEOUT_SECS", default_value_t = 600)]
    pub idle_timeout_secs: u64,

    /// Maximum lifetime of a connection in seconds
    #[arg(long, env = "SSO_DB_MAX_LIFETIME_SECS", default_value_t = 1800)]
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "SSO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the public API
    #[arg(long, env = "SSO_PORT", default_value_t = 44044)]
    pub port: u16,

    /// Port for health probes and app administration
    #[arg(long, env = "SSO_MGMT_PORT", default_value_t = 44045)]
    pub mgmt_port: u16,

    /// Seconds to wait for background tasks on shutdown
    #[arg(long, env = "SSO_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Access token time-to-live in seconds (at most one year)
    #[arg(
        long,
        env = "SSO_ACCESS_TOKEN_TTL_SECS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..=31_536_000)
    )]
    pub access_token_ttl_secs: u64,

    /// Refresh token time-to-live in days (at most ten years)
    #[arg(
        long,
        env = "SSO_REFRESH_TOKEN_TTL_DAYS",
        default_value_t = 30,
        value_parser = clap::value_parser!(i64).range(1..=3650)
    )]
    pub refresh_token_ttl_days: i64,

    /// Upper bound for any single store call, in milliseconds
    #[arg(long, env = "SSO_STORE_TIMEOUT_MS", default_value_t = 5000)]
    pub store_timeout_ms: u64,
}

impl AuthConfig {
    #[must_use]
    pub const fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    /// `None` if the configured day count does not fit in a duration.
    #[must_use]
    pub fn refresh_token_ttl(&self) -> Option<time::Duration> {
        self.refresh_token_ttl_days.checked_mul(86_400).map(time::Duration::seconds)
    }

    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Argon2id work factor.
#[derive(Clone, Debug, Args)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    #[arg(long, env = "SSO_ARGON2_M_COST", default_value_t = 19_456)]
    pub m_cost: u32,

    /// Number of iterations
    #[arg(long, env = "SSO_ARGON2_T_COST", default_value_t = 2)]
    pub t_cost: u32,

    /// Degree of parallelism
    #[arg(long, env = "SSO_ARGON2_P_COST", default_value_t = 1)]
    pub p_cost: u32,
}

#[derive(Clone, Debug, Args)]
pub struct SweeperConfig {
    /// How often expired refresh tokens are purged (0 disables the sweeper)
    #[arg(long = "sweep-interval-secs", env = "SSO_SWEEP_INTERVAL_SECS", default_value_t = 86_400)]
    pub interval_secs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "SSO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; telemetry export is disabled when unset
    #[arg(long, env = "SSO_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Config, clap::Error> {
        let mut args = vec!["tenant-sso", "--database-url", "postgres://localhost/sso"];
        args.extend_from_slice(extra);
        Config::try_parse_from(args)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.auth.access_token_ttl(), Duration::from_secs(3600));
        assert_eq!(config.auth.refresh_token_ttl(), Some(time::Duration::days(30)));
        assert_eq!(config.sweeper.interval_secs, 86_400);
    }

    #[test]
    fn test_token_lifetimes_are_bounded() {
        for days in ["0", "-1", "10000000"] {
            assert!(parse(&["--refresh-token-ttl-days", days]).is_err(), "accepted {days} days");
        }
        assert!(parse(&["--access-token-ttl-secs", "0"]).is_err());
        assert!(parse(&["--access-token-ttl-secs", "999999999999"]).is_err());
        assert_eq!(parse(&["--refresh-token-ttl-days", "3650"]).unwrap().auth.refresh_token_ttl_days, 3650);
    }

    #[test]
    fn test_refresh_ttl_overflow_is_none() {
        let auth = AuthConfig { access_token_ttl_secs: 1, refresh_token_ttl_days: i64::MAX, store_timeout_ms: 1 };
        assert!(auth.refresh_token_ttl().is_none());
    }
}
