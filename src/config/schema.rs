//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Downstream broker settings.
    pub broker: BrokerConfig,

    /// Transform stage selection.
    pub transform: TransformConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4315").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4315".to_string(),
        }
    }
}

/// Broker (context-management service) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Base url of the broker's NGSI v2 API, without the `/v2` suffix.
    pub base_url: Url,

    /// Outbound client timeout in seconds. 0 disables the timeout.
    pub timeout_secs: u64,
}

impl BrokerConfig {
    pub const DEFAULT_PORT: u16 = 1026;
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:1026").expect("default broker url is valid"),
            timeout_secs: 10,
        }
    }
}

/// How a Job's current operation is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperationResolution {
    /// Job → `RefPart` → Part `Operations`, matched on `CurrentOperationType`.
    #[default]
    PartOperations,
    /// Job → `RefOperation` → Operation.
    OperationReference,
}

/// Transform stage configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransformConfig {
    /// Enable the counter transform. When off, requests pass through.
    pub enabled: bool,

    /// Entity resolution strategy for the counter transform.
    pub resolution: OperationResolution,
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum device payload size in bytes.
    pub max_body_size: usize,

    /// Total time allowed per device call in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
