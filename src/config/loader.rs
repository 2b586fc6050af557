//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::config::schema::{BrokerConfig, GatewayConfig};
use crate::config::validation::{validate_config, ConfigIssue};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<ConfigIssue>),

    #[error("invalid environment variable {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the deployment environment on top of a loaded config.
///
/// Recognised variables: `PORT`, `USE_PLUGIN`, `ORION_HOST`, `ORION_PORT`,
/// `LOGGING_LEVEL`. `env` is the variable source, normally
/// `|name| std::env::var(name).ok()`.
pub fn apply_env_overrides(
    config: &mut GatewayConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(port) = env("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => {
                let host = config
                    .listener
                    .bind_address
                    .rsplit_once(':')
                    .map(|(host, _)| host)
                    .unwrap_or("0.0.0.0");
                config.listener.bind_address = format!("{host}:{port}");
            }
            Err(_) => tracing::warn!(
                value = %port,
                bind_address = %config.listener.bind_address,
                "PORT is not a port number, keeping the configured one"
            ),
        }
    }

    if let Some(flag) = env("USE_PLUGIN") {
        config.transform.enabled = flag.trim().eq_ignore_ascii_case("true");
    }

    match (env("ORION_HOST"), env("ORION_PORT")) {
        (Some(host), port) => {
            config.broker.base_url = broker_url(host.trim(), port.as_deref())?;
        }
        (None, Some(port)) => {
            let port = parse_broker_port(&port)?;
            config
                .broker
                .base_url
                .set_port(Some(port))
                .map_err(|_| ConfigError::InvalidEnv {
                    name: "ORION_PORT",
                    reason: format!("{} cannot carry a port", config.broker.base_url),
                })?;
        }
        (None, None) => {}
    }

    if let Some(level) = env("LOGGING_LEVEL") {
        config.observability.log_level = level.trim().to_ascii_lowercase();
    }

    Ok(())
}

fn broker_url(host: &str, port: Option<&str>) -> Result<Url, ConfigError> {
    let port = match port {
        Some(port) => parse_broker_port(port)?,
        None => BrokerConfig::DEFAULT_PORT,
    };
    Url::parse(&format!("http://{host}:{port}")).map_err(|e| ConfigError::InvalidEnv {
        name: "ORION_HOST",
        reason: format!("'{host}': {e}"),
    })
}

fn parse_broker_port(port: &str) -> Result<u16, ConfigError> {
    port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: "ORION_PORT",
        reason: format!("'{port}' is not a port number"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_no_env_keeps_config() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, env_of(&[])).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:4315");
        assert_eq!(config.broker.base_url.as_str(), "http://localhost:1026/");
        assert!(!config.transform.enabled);
    }

    #[test]
    fn test_deployment_variables() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(
            &mut config,
            env_of(&[
                ("PORT", "8080"),
                ("USE_PLUGIN", "True"),
                ("ORION_HOST", "orion"),
                ("LOGGING_LEVEL", "INFO"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.transform.enabled);
        assert_eq!(config.broker.base_url.as_str(), "http://orion:1026/");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_use_plugin_other_values_disable() {
        let mut config = GatewayConfig::default();
        config.transform.enabled = true;
        apply_env_overrides(&mut config, env_of(&[("USE_PLUGIN", "yes")])).unwrap();
        assert!(!config.transform.enabled);
    }

    #[test]
    fn test_unparsable_port_keeps_configured_one() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, env_of(&[("PORT", "eighty")])).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:4315");
    }

    #[test]
    fn test_broker_port_alone() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, env_of(&[("ORION_PORT", "1027")])).unwrap();
        assert_eq!(config.broker.base_url.as_str(), "http://localhost:1027/");

        let err = apply_env_overrides(&mut config, env_of(&[("ORION_PORT", "x")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "ORION_PORT", .. }));
    }

    #[test]
    fn test_broker_host_and_port() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(
            &mut config,
            env_of(&[("ORION_HOST", "10.0.0.7"), ("ORION_PORT", "2026")]),
        )
        .unwrap();
        assert_eq!(config.broker.base_url.as_str(), "http://10.0.0.7:2026/");
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("plc-gateway-{}.toml", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[broker]\nbase_url = \"http://orion:1026\"\n\n[transform]\nenabled = true\nresolution = \"operation_reference\""
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(config.transform.enabled);
        assert_eq!(config.broker.base_url.host_str(), Some("orion"));
        assert_eq!(config.listener.bind_address, "0.0.0.0:4315");
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let path = std::env::temp_dir().join(format!("plc-gateway-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[limits]\nmax_body_size = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(matches!(err, ConfigError::Validation(ref issues) if issues.len() == 1));
        assert!(err.to_string().contains("limits.max_body_size"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/plc-gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
