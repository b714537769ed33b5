//! Runtime configuration for the placement engine.
//!
//! Values come from the process environment after an optional `.env` file has
//! been loaded with `dotenvy`. Every setting has a default except
//! `DATABASE_URL`, which only the sweeper binary requires.

use std::env;
use std::time::Duration;
use thiserror::Error;

const ENV_VAR: &str = "PLACEMENT_ENV";
const LOG_LEVEL_VAR: &str = "PLACEMENT_LOG_LEVEL";
const DATABASE_URL_VAR: &str = "DATABASE_URL";
const POOL_SIZE_VAR: &str = "PLACEMENT_DB_POOL_SIZE";
const SWEEP_INTERVAL_VAR: &str = "PLACEMENT_SWEEP_INTERVAL_SECS";
const RETRY_BACKOFF_VAR: &str = "PLACEMENT_STORE_RETRY_BACKOFF_MS";

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;

/// Deployment stage the engine runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEnvironment {
    /// Local development.
    Development,
    /// Automated test runs.
    Test,
    /// Live deployment.
    Production,
}

impl EngineEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A numeric variable did not parse.
    #[error("{variable} must be a non-negative integer, got '{value}'")]
    InvalidNumber {
        /// Name of the offending variable.
        variable: &'static str,
        /// Raw value found in the environment.
        value: String,
    },

    /// A variable parsed but is outside its accepted range.
    #[error("{variable} must be greater than zero")]
    MustBePositive {
        /// Name of the offending variable.
        variable: &'static str,
    },

    /// `DATABASE_URL` was needed but not set.
    #[error("DATABASE_URL must be set to run against PostgreSQL")]
    MissingDatabaseUrl,
}

/// Tracing controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Fallback `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL, when configured.
    pub url: Option<String>,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
}

impl DatabaseConfig {
    /// Returns the connection URL or an error when it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when no URL was configured.
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url.as_deref().ok_or(ConfigError::MissingDatabaseUrl)
    }
}

/// Workflow timing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Period between scheduled sweeps.
    pub sweep_interval: Duration,
    /// Pause before the single retry of a failed store commit.
    pub retry_backoff: Duration,
}

/// Top-level configuration for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Deployment stage.
    pub environment: EngineEnvironment,
    /// Tracing controls.
    pub telemetry: TelemetryConfig,
    /// Storage settings.
    pub database: DatabaseConfig,
    /// Workflow timing settings.
    pub workflow: WorkflowConfig,
}

impl EngineConfig {
    /// Loads `.env` when present and reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a numeric setting is malformed or out of
    /// range.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a numeric setting is malformed or out of
    /// range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup(ENV_VAR)
            .as_deref()
            .map_or(EngineEnvironment::Development, EngineEnvironment::parse);
        let log_level = lookup(LOG_LEVEL_VAR)
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());
        let url = lookup(DATABASE_URL_VAR).filter(|url| !url.trim().is_empty());
        let pool_size = parse_number(&lookup, POOL_SIZE_VAR, DEFAULT_POOL_SIZE)?;
        let sweep_secs = parse_number(&lookup, SWEEP_INTERVAL_VAR, DEFAULT_SWEEP_INTERVAL_SECS)?;
        let backoff_ms = parse_number(&lookup, RETRY_BACKOFF_VAR, DEFAULT_RETRY_BACKOFF_MS)?;

        if pool_size == 0 {
            return Err(ConfigError::MustBePositive {
                variable: POOL_SIZE_VAR,
            });
        }
        if sweep_secs == 0 {
            return Err(ConfigError::MustBePositive {
                variable: SWEEP_INTERVAL_VAR,
            });
        }

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            database: DatabaseConfig { url, pool_size },
            workflow: WorkflowConfig {
                sweep_interval: Duration::from_secs(sweep_secs),
                retry_backoff: Duration::from_millis(backoff_ms),
            },
        })
    }
}

fn parse_number<F, T>(lookup: &F, variable: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(variable).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable, value: raw })
    })
}
