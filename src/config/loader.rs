//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::{LogFormat, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "APP_";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: String, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value } => {
                write!(f, "Invalid value '{}' for environment variable {}", value, key)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file, apply `APP_*` overrides from the process environment,
/// then validate.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: ServiceConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Defaults plus environment overrides, for running without a file.
pub fn load_from_env() -> Result<ServiceConfig, ConfigError> {
    let mut config = ServiceConfig::default();
    apply_env_overrides(&mut config, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse and validate TOML text. The environment is not consulted.
pub fn load_from_str(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply recognised `APP_*` variables. Unknown variables are ignored.
pub fn apply_env_overrides<I>(config: &mut ServiceConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(name) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };

        match name {
            "NAME" => config.service.app_name = value,
            "VERSION" => config.service.app_version = value,
            "ENV" => config.service.env = value,
            "POD_NAME" => config.service.pod_name = value,
            "BIND_ADDRESS" => config.listener.bind_address = value,
            "HEALTH_CHECK_TIMEOUT_MS" => {
                config.health.check_timeout_ms = parse_env(&key, &value)?;
            }
            "POOL_SIZE" => config.dispatch.pool_size = parse_env(&key, &value)?,
            "SUBMISSION_TIMEOUT_MS" => {
                config.dispatch.submission_timeout_ms = parse_env(&key, &value)?;
            }
            "COMPUTATION_TIMEOUT_MS" => {
                config.dispatch.computation_timeout_ms = parse_env(&key, &value)?;
            }
            "ENABLE_HEAVY_ENDPOINTS" => {
                config.dispatch.enable_heavy_endpoints = parse_env(&key, &value)?;
            }
            "LOG_LEVEL" => config.observability.log_level = value,
            "LOG_FORMAT" => {
                config.observability.log_format = match value.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::Env { key, value }),
                };
            }
            "METRICS_ENABLED" => {
                config.observability.metrics_enabled = parse_env(&key, &value)?;
            }
            "METRICS_ADDRESS" => config.observability.metrics_address = value,
            "REQUEST_TIMEOUT_SECS" => {
                config.timeouts.request_secs = parse_env(&key, &value)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [service]
            pod_name = "pod-7"

            [dispatch]
            pool_size = 2
            submission_timeout_ms = 50
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.dispatch.pool_size, 2);
        assert_eq!(config.dispatch.submission_timeout_ms, 50);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/service.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let err = load_from_str("[dispatch]\npool_size = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors[0].field, "dispatch.pool_size"),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            load_from_str("[dispatch\n").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(
            &mut config,
            vars(&[
                ("APP_ENV", "production"),
                ("APP_POD_NAME", "web-0"),
                ("APP_POOL_SIZE", "4"),
                ("APP_ENABLE_HEAVY_ENDPOINTS", "false"),
                ("APP_LOG_FORMAT", "JSON"),
                ("HOME", "/root"),
            ]),
        )
        .unwrap();

        assert_eq!(config.service.env, "production");
        assert_eq!(config.service.pod_name, "web-0");
        assert_eq!(config.dispatch.pool_size, 4);
        assert!(!config.dispatch.enable_heavy_endpoints);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unparseable_env_value() {
        let mut config = ServiceConfig::default();
        let err = apply_env_overrides(&mut config, vars(&[("APP_POOL_SIZE", "many")])).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid value 'many' for environment variable APP_POOL_SIZE"
        );
    }
}
