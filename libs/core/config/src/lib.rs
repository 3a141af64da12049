pub mod server;
pub mod tracing;

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Invalid value for '{key}': {details}")]
    InvalidValue { key: String, details: String },
}

/// Application environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Name and version of the running binary, reported by `/health`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Builds an [`AppInfo`] from the calling crate's Cargo metadata.
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::AppInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    };
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load and parse environment variable or return error
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an environment variable into `T`, falling back to `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Whole seconds from the environment as a [`Duration`]. Zero is rejected.
pub fn env_duration_secs(key: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    let secs: u64 = env_parse(key, default_secs)?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            details: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_app_info_macro_uses_crate_metadata() {
        let info = app_info!();
        assert_eq!(info.name, "core_config");
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("SNAPBOX_TEST_VAR", Some("set"), || {
            assert_eq!(env_or_default("SNAPBOX_TEST_VAR", "fallback"), "set");
        });
        temp_env::with_var_unset("SNAPBOX_TEST_VAR", || {
            assert_eq!(env_or_default("SNAPBOX_TEST_VAR", "fallback"), "fallback");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("SNAPBOX_REQUIRED", || {
            let err = env_required("SNAPBOX_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("SNAPBOX_REQUIRED"));
        });
    }

    #[test]
    fn test_env_parse_default_and_value() {
        temp_env::with_var_unset("SNAPBOX_PERCENT", || {
            assert_eq!(env_parse::<u32>("SNAPBOX_PERCENT", 20).unwrap(), 20);
        });
        temp_env::with_var("SNAPBOX_PERCENT", Some(" 35 "), || {
            assert_eq!(env_parse::<u32>("SNAPBOX_PERCENT", 20).unwrap(), 35);
        });
    }

    #[test]
    fn test_env_parse_invalid() {
        temp_env::with_var("SNAPBOX_PERCENT", Some("lots"), || {
            let err = env_parse::<u32>("SNAPBOX_PERCENT", 20).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::ParseError { ref key, .. } if key == "SNAPBOX_PERCENT"
            ));
        });
    }

    #[test]
    fn test_env_duration_secs_rejects_zero() {
        temp_env::with_var("SNAPBOX_TIMEOUT", Some("0"), || {
            assert!(env_duration_secs("SNAPBOX_TIMEOUT", 30).is_err());
        });
        temp_env::with_var_unset("SNAPBOX_TIMEOUT", || {
            assert_eq!(
                env_duration_secs("SNAPBOX_TIMEOUT", 30).unwrap(),
                Duration::from_secs(30)
            );
        });
    }
}
