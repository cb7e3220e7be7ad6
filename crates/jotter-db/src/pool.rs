//! Connection pool for the enrichment job.
//!
//! The job is a single process with three concurrent task families, each of
//! which holds at most one connection at a time, so the pool stays small.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use jotter_core::defaults::ENV_DATABASE_MAX_CONNECTIONS;
use jotter_core::{Error, Result};

/// One connection per task family plus one spare.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// How long a family waits for a free connection.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connections idle longer than this are closed between passes.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Pool sizing and timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    /// Read overrides from the process environment.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DATABASE_MAX_CONNECTIONS` | `4` | Pool size cap (at least 1) |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    ///
    /// Unparseable values fall back to the default.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_connections = get(ENV_DATABASE_MAX_CONNECTIONS)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS)
            .max(1);
        Self::default().with_max_connections(max_connections)
    }

    pub fn with_max_connections(mut self, n: u32) -> Self {
        self.max_connections = n.max(1);
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// Connect with the default pool configuration.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

/// Connect with an explicit pool configuration.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    debug!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        "Connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(0)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        duration_ms = start.elapsed().as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup_defaults_when_unset() {
        assert_eq!(PoolConfig::from_lookup(|_| None), PoolConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_max_connections() {
        let config = PoolConfig::from_lookup(|key| {
            (key == ENV_DATABASE_MAX_CONNECTIONS).then(|| " 8 ".to_string())
        });
        assert_eq!(config.max_connections, 8);
    }

    #[test]
    fn test_from_lookup_ignores_garbage_and_zero() {
        let garbage = PoolConfig::from_lookup(|_| Some("many".to_string()));
        assert_eq!(garbage.max_connections, DEFAULT_MAX_CONNECTIONS);

        let zero = PoolConfig::from_lookup(|_| Some("0".to_string()));
        assert_eq!(zero.max_connections, 1);
    }

    #[test]
    fn test_builders() {
        let config = PoolConfig::default()
            .with_max_connections(0)
            .with_acquire_timeout(Duration::from_secs(5))
            .with_idle_timeout(Duration::from_secs(60));
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
    }
}
