//! Environment configuration for the status updater
//!
//! Provides trait-based access to environment configuration,
//! enabling dependency injection and mocking for tests.

use std::time::Duration;

use crate::retry::RetryConfig;
use crate::{Error, Result};

/// Default field manager recorded on status patches
pub const DEFAULT_FIELD_MANAGER: &str = "lattice-work-agent";

/// Environment variable overriding the field manager
pub const ENV_FIELD_MANAGER: &str = "LATTICE_WORK_FIELD_MANAGER";
/// Environment variable overriding the maximum number of write attempts
pub const ENV_RETRY_ATTEMPTS: &str = "LATTICE_WORK_STATUS_RETRY_ATTEMPTS";
/// Environment variable overriding the first backoff delay, in milliseconds
pub const ENV_RETRY_INITIAL_DELAY_MS: &str = "LATTICE_WORK_STATUS_RETRY_INITIAL_DELAY_MS";
/// Environment variable overriding the backoff cap, in milliseconds
pub const ENV_RETRY_MAX_DELAY_MS: &str = "LATTICE_WORK_STATUS_RETRY_MAX_DELAY_MS";

/// Trait for reading the updater's environment configuration
///
/// This abstracts reading from environment variables, enabling
/// proper unit testing without manipulating global state.
#[cfg_attr(test, mockall::automock)]
pub trait WorkEnvConfig: Send + Sync {
    /// Field manager name for status patches
    fn field_manager(&self) -> Option<String>;

    /// Maximum number of conflicting write attempts (0 = unbounded)
    fn status_retry_attempts(&self) -> Option<String>;

    /// First backoff delay in milliseconds
    fn status_retry_initial_delay_ms(&self) -> Option<String>;

    /// Backoff cap in milliseconds
    fn status_retry_max_delay_ms(&self) -> Option<String>;
}

/// Default implementation that reads from environment variables
#[derive(Clone, Default)]
pub struct OsEnvConfig;

impl WorkEnvConfig for OsEnvConfig {
    fn field_manager(&self) -> Option<String> {
        std::env::var(ENV_FIELD_MANAGER).ok()
    }

    fn status_retry_attempts(&self) -> Option<String> {
        std::env::var(ENV_RETRY_ATTEMPTS).ok()
    }

    fn status_retry_initial_delay_ms(&self) -> Option<String> {
        std::env::var(ENV_RETRY_INITIAL_DELAY_MS).ok()
    }

    fn status_retry_max_delay_ms(&self) -> Option<String> {
        std::env::var(ENV_RETRY_MAX_DELAY_MS).ok()
    }
}

/// Settings for status updates
#[derive(Clone, Debug, PartialEq)]
pub struct UpdaterConfig {
    /// Field manager recorded on status patches
    pub field_manager: String,
    /// Conflict retry policy
    pub retry: RetryConfig,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl UpdaterConfig {
    /// Load settings, applying any overrides present in `env`
    pub fn from_env(env: &dyn WorkEnvConfig) -> Result<Self> {
        let mut config = Self::default();

        if let Some(manager) = env.field_manager().filter(|m| !m.trim().is_empty()) {
            config.field_manager = manager.trim().to_string();
        }
        if let Some(raw) = env.status_retry_attempts() {
            let attempts = parse_number(ENV_RETRY_ATTEMPTS, &raw)?;
            config.retry.max_attempts = u32::try_from(attempts).map_err(|_| {
                Error::validation(format!("{ENV_RETRY_ATTEMPTS} is too large: {attempts}"))
            })?;
        }
        if let Some(raw) = env.status_retry_initial_delay_ms() {
            config.retry.initial_delay =
                Duration::from_millis(parse_number(ENV_RETRY_INITIAL_DELAY_MS, &raw)?);
        }
        if let Some(raw) = env.status_retry_max_delay_ms() {
            config.retry.max_delay =
                Duration::from_millis(parse_number(ENV_RETRY_MAX_DELAY_MS, &raw)?);
        }

        if config.retry.initial_delay > config.retry.max_delay {
            return Err(Error::validation(format!(
                "{ENV_RETRY_INITIAL_DELAY_MS} ({}ms) exceeds {ENV_RETRY_MAX_DELAY_MS} ({}ms)",
                config.retry.initial_delay.as_millis(),
                config.retry.max_delay.as_millis()
            )));
        }

        Ok(config)
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| {
        Error::validation(format!(
            "{name} must be a non-negative integer, got {raw:?}"
        ))
    })
}
