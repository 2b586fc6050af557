//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses and the broker url are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ConfigIssue>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let base_url = &config.broker.base_url;
    if !matches!(base_url.scheme(), "http" | "https") {
        issues.push(ConfigIssue::new(
            "broker.base_url",
            format!("scheme '{}' is not http or https", base_url.scheme()),
        ));
    }
    if base_url.cannot_be_a_base() || base_url.host_str().is_none() {
        issues.push(ConfigIssue::new(
            "broker.base_url",
            format!("'{base_url}' cannot be used as a base url"),
        ));
    }

    if config.limits.max_body_size == 0 {
        issues.push(ConfigIssue::new("limits.max_body_size", "must be greater than 0"));
    }
    if config.limits.request_timeout_secs == 0 {
        issues.push(ConfigIssue::new(
            "limits.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        issues.push(ConfigIssue::new(
            "observability.log_level",
            format!(
                "'{}' is not one of {}",
                observability.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(ConfigIssue::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
