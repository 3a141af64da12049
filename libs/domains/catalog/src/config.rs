use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_duration_secs, env_or_default, env_parse};
use database::RetryConfig;

pub const DEFAULT_PARTITION_KEY: &str = "item";
pub const DEFAULT_THUMB_PERCENT: u32 = 20;

/// Catalog behaviour knobs.
///
/// | Variable | Default |
/// |---|---|
/// | `CATALOG_PARTITION_KEY` | `item` |
/// | `CATALOG_THUMB_PERCENT` | `20` |
/// | `CATALOG_CALL_TIMEOUT_SECS` | `30` |
/// | `CATALOG_READ_RETRIES` | `2` |
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Written on every record and used to filter every query
    pub partition_key: String,
    /// Thumbnail size as a percentage of the original dimensions (1-100)
    pub thumb_percent: u32,
    /// Upper bound for any single collaborator call
    pub call_timeout: Duration,
    /// Retries for idempotent reads that fail transiently
    pub read_retries: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            thumb_percent: DEFAULT_THUMB_PERCENT,
            call_timeout: Duration::from_secs(30),
            read_retries: 2,
        }
    }
}

impl CatalogConfig {
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_read_retries(mut self, retries: u32) -> Self {
        self.read_retries = retries;
        self
    }

    /// Backoff for idempotent reads.
    pub fn read_retry(&self) -> RetryConfig {
        RetryConfig::new()
            .with_max_retries(self.read_retries)
            .with_initial_delay(50)
    }
}

impl FromEnv for CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let partition_key = env_or_default("CATALOG_PARTITION_KEY", DEFAULT_PARTITION_KEY)
            .trim()
            .to_string();
        if partition_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "CATALOG_PARTITION_KEY".to_string(),
                details: "must not be blank".to_string(),
            });
        }

        let thumb_percent: u32 = env_parse("CATALOG_THUMB_PERCENT", DEFAULT_THUMB_PERCENT)?;
        if !(1..=100).contains(&thumb_percent) {
            return Err(ConfigError::InvalidValue {
                key: "CATALOG_THUMB_PERCENT".to_string(),
                details: format!("{} is outside 1-100", thumb_percent),
            });
        }

        Ok(Self {
            partition_key,
            thumb_percent,
            call_timeout: env_duration_secs("CATALOG_CALL_TIMEOUT_SECS", 30)?,
            read_retries: env_parse("CATALOG_READ_RETRIES", 2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(
            [
                "CATALOG_PARTITION_KEY",
                "CATALOG_THUMB_PERCENT",
                "CATALOG_CALL_TIMEOUT_SECS",
                "CATALOG_READ_RETRIES",
            ],
            || {
                let config = CatalogConfig::from_env().unwrap();
                assert_eq!(config.partition_key, "item");
                assert_eq!(config.thumb_percent, 20);
                assert_eq!(config.call_timeout, Duration::from_secs(30));
                assert_eq!(config.read_retries, 2);
            },
        );
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("CATALOG_PARTITION_KEY", Some("garage")),
                ("CATALOG_THUMB_PERCENT", Some("35")),
                ("CATALOG_CALL_TIMEOUT_SECS", Some("5")),
            ],
            || {
                let config = CatalogConfig::from_env().unwrap();
                assert_eq!(config.partition_key, "garage");
                assert_eq!(config.thumb_percent, 35);
                assert_eq!(config.call_timeout, Duration::from_secs(5));
            },
        );
    }

    #[test]
    fn test_thumb_percent_out_of_range() {
        temp_env::with_var("CATALOG_THUMB_PERCENT", Some("0"), || {
            assert!(matches!(
                CatalogConfig::from_env(),
                Err(ConfigError::InvalidValue { .. })
            ));
        });
    }

    #[test]
    fn test_blank_partition_key_rejected() {
        temp_env::with_var("CATALOG_PARTITION_KEY", Some("  "), || {
            assert!(CatalogConfig::from_env().is_err());
        });
    }
}
