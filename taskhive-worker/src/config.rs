/// Configuration management for the worker
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `WORKER_POLL_INTERVAL_SECS`: Queue poll interval (default: 5)
/// - `WORKER_BATCH_SIZE`: Jobs claimed per poll (default: 10)
/// - `WORKER_MAX_CONCURRENT`: Jobs executed at once (default: 10)
/// - Push provider settings are read by the shared `PushConfig` loader
use std::env;

use taskhive_shared::push::PushConfig;

use crate::runner::RunnerConfig;

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Runner loop settings
    pub runner: RunnerConfig,

    /// Push provider configuration
    pub push: PushConfig,
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a numeric variable
    /// fails to parse. Push settings are optional; an unconfigured channel
    /// simply cannot deliver.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let defaults = RunnerConfig::default();

        let poll_interval_secs = env::var("WORKER_POLL_INTERVAL_SECS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()?
            .unwrap_or(defaults.poll_interval_secs);

        let batch_size = env::var("WORKER_BATCH_SIZE")
            .ok()
            .map(|v| v.parse::<i64>())
            .transpose()?
            .unwrap_or(defaults.batch_size);

        let max_concurrent = env::var("WORKER_MAX_CONCURRENT")
            .ok()
            .map(|v| v.parse::<usize>())
            .transpose()?
            .unwrap_or(defaults.max_concurrent);

        Ok(Self {
            database_url,
            max_connections,
            runner: RunnerConfig {
                poll_interval_secs,
                batch_size,
                max_concurrent,
            },
            push: PushConfig::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_concurrent, 10);
    }
}
