//! Layered runtime configuration for the catalog core.
//!
//! # Responsibility
//! - Describe storage, logging and notification settings in one serde model.
//! - Merge built-in defaults, an optional TOML file and `CATALOG_` environment
//!   variables, in that order of increasing priority.
//!
//! # Invariants
//! - Nested keys in environment variables are separated by `__`, e.g.
//!   `CATALOG_LOGGING__LEVEL=warn`.
//! - Every notification retry has exactly one backoff interval.

use crate::logging::default_log_level;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "CATALOG_";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_NOTIFY_DELAY_SECS: u64 = 10;
const DEFAULT_NOTIFY_RETRIES: u32 = 3;
const DEFAULT_NOTIFY_RETRY_INTERVALS_SECS: [u64; 3] = [60, 300, 900];

#[derive(Debug)]
pub enum ConfigError {
    /// A provider could not be read or a value has the wrong shape.
    Load(Box<figment::Error>),
    /// Values parsed but violate a cross-field rule.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "failed to load configuration: {err}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err.as_ref()),
            Self::Invalid(_) => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Load(Box::new(value))
    }
}

/// Root configuration model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoreConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub notify: NotifyConfig,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Log sink settings consumed by [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            directory: None,
        }
    }
}

/// Delivery policy handed to the external scheduler with every deferred job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub delay_secs: u64,
    pub retries: u32,
    pub retry_intervals_secs: Vec<u64>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            delay_secs: DEFAULT_NOTIFY_DELAY_SECS,
            retries: DEFAULT_NOTIFY_RETRIES,
            retry_intervals_secs: DEFAULT_NOTIFY_RETRY_INTERVALS_SECS.to_vec(),
        }
    }
}

impl NotifyConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn retry_intervals(&self) -> Vec<Duration> {
        self.retry_intervals_secs
            .iter()
            .copied()
            .map(Duration::from_secs)
            .collect()
    }
}

impl CoreConfig {
    /// Loads configuration from defaults, an optional TOML file and env vars.
    ///
    /// A missing file is not an error; its layer is simply empty.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::extract(Self::figment(path))
    }

    /// Builds the layered provider stack without extracting it.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(CoreConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extracts and validates a configuration from any provider stack.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: CoreConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let intervals = self.notify.retry_intervals_secs.len();
        if intervals != self.notify.retries as usize {
            return Err(ConfigError::Invalid(format!(
                "notify.retries is {} but {} retry intervals are configured",
                self.notify.retries, intervals
            )));
        }
        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "database.busy_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use figment::providers::{Format, Toml};
    use figment::Jail;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    #[test]
    fn defaults_match_documented_policy() {
        let config = CoreConfig::default();
        assert_eq!(config.database.path, None);
        assert_eq!(config.database.busy_timeout(), Duration::from_secs(5));
        assert_eq!(config.notify.delay(), Duration::from_secs(10));
        assert_eq!(config.notify.retries, 3);
        assert_eq!(
            config.notify.retry_intervals(),
            vec![
                Duration::from_secs(60),
                Duration::from_secs(300),
                Duration::from_secs(900)
            ]
        );
    }

    #[test]
    fn toml_file_overrides_defaults_and_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "catalog.toml",
                r#"
                [database]
                path = "/var/lib/catalog/catalog.db"

                [logging]
                level = "debug"
                "#,
            )?;
            jail.set_env("CATALOG_LOGGING__LEVEL", "warn");

            let config = CoreConfig::load(Some(Path::new("catalog.toml")))
                .map_err(|err| err.to_string())?;
            assert_eq!(
                config.database.path,
                Some(PathBuf::from("/var/lib/catalog/catalog.db"))
            );
            assert_eq!(config.logging.level, "warn");
            assert_eq!(config.notify.retries, 3);
            Ok(())
        });
    }

    #[test]
    fn mismatched_retry_policy_is_rejected() {
        let figment = CoreConfig::figment(None).merge(Toml::string(
            r#"
            [notify]
            retries = 2
            retry_intervals_secs = [30]
            "#,
        ));

        let err = CoreConfig::extract(figment).expect_err("retry mismatch must fail");
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("retries")));
    }
}
