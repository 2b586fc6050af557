//! Replays a [`RequestSpec`] against the broker.
//!
//! # Responsibilities
//! - Turn a request spec into an outbound HTTP request
//! - Classify failures: bad target (device's fault) vs unreachable broker
//! - Hand back status, content type and body for relay
//!
//! # Design Decisions
//! - No retries; the first failure is reported
//! - Timeout policy lives in the shared [`Client`], configured from `broker.timeout_secs`

use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode};
use reqwest::header::{HeaderMap, HeaderName, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::config::BrokerConfig;
use crate::pipeline::{Method, RequestSpec};

/// Errors that can occur while sending to the broker.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The target url cannot be sent to (unsupported scheme and the like).
    #[error("cannot send to {url}: {reason}")]
    InvalidTarget { url: String, reason: String },

    /// A header name or value is not valid on the wire.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    /// Connection to the broker failed.
    #[error("broker unreachable: {0}")]
    Unavailable(String),

    /// The broker did not answer in time.
    #[error("broker timed out: {0}")]
    Timeout(String),

    /// Any other transport failure.
    #[error("broker request failed: {0}")]
    Failed(String),
}

/// What the broker answered.
#[derive(Debug, Clone)]
pub struct BrokerResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Build the outbound client shared by dispatch and the entity store.
///
/// The broker is always addressed directly; system proxy settings are ignored.
pub fn build_client(config: &BrokerConfig) -> reqwest::Result<Client> {
    let mut builder = Client::builder().no_proxy();
    if config.timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.timeout_secs));
    }
    builder.build()
}

/// Sends request specs to the broker.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
}

impl Dispatcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn send(&self, spec: &RequestSpec) -> Result<BrokerResponse, DispatchError> {
        let url = spec.url.as_str();
        if !matches!(spec.url.scheme(), "http" | "https") {
            return Err(DispatchError::InvalidTarget {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", spec.url.scheme()),
            });
        }

        let method = match spec.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self
            .client
            .request(method, spec.url.clone())
            .headers(outbound_headers(spec)?);
        if let Some(body) = &spec.body {
            request = request.body(body.clone());
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(|e| classify(url, e))?;

        tracing::info!(url = %url, status = %status, bytes = body.len(), "Broker responded");
        Ok(BrokerResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Bare header names go out with an empty value.
fn outbound_headers(spec: &RequestSpec) -> Result<HeaderMap, DispatchError> {
    let mut headers = HeaderMap::with_capacity(spec.headers.len());
    for (name, value) in spec.headers.iter() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| DispatchError::InvalidHeader(name.to_string()))?;
        let header_value = HeaderValue::from_str(value.unwrap_or(""))
            .map_err(|_| DispatchError::InvalidHeader(name.to_string()))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

fn classify(url: &str, error: reqwest::Error) -> DispatchError {
    if error.is_connect() {
        DispatchError::Unavailable(format!("{url}: {error}"))
    } else if error.is_timeout() {
        DispatchError::Timeout(format!("{url}: {error}"))
    } else if error.is_builder() {
        DispatchError::InvalidTarget {
            url: url.to_string(),
            reason: error.to_string(),
        }
    } else {
        DispatchError::Failed(format!("{url}: {error}"))
    }
}
