//! Semantic checks on a decoded payload.
//!
//! Rules run in a fixed order and the first violation is returned:
//! method present → method known → method implemented → mandatory keys →
//! url → headers → content type and body shape (POST/PUT only).

use serde_json::Value;
use url::Url;

use crate::pipeline::decode::{extract_headers, DecodedRequest, ENRICHMENT_KEYS};
use crate::pipeline::error::ValidationError;
use crate::pipeline::spec::{ContentType, Enrichment, Headers, Method, Payload};

/// A payload that passed every rule and is safe to build.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub url: Url,
    pub method: Method,
    pub headers: Headers,
    /// Present exactly when `method.requires_body()`.
    pub payload: Option<Payload>,
    pub enrichment: Option<Enrichment>,
}

/// Validate a decoded payload.
pub fn validate(decoded: &DecodedRequest) -> Result<ValidatedRequest, ValidationError> {
    let method = validate_method(decoded)?;
    validate_mandatory_keys(decoded, method)?;
    let url = validate_url(decoded)?;
    let headers = extract_headers(required(decoded, "headers")?)?;

    let payload = if method.requires_body() {
        let content_type = validate_content_type(&headers)?;
        Some(validate_payload(required(decoded, "data")?, content_type, method)?)
    } else {
        None
    };

    Ok(ValidatedRequest {
        url,
        method,
        headers,
        payload,
        enrichment: extract_enrichment(decoded)?,
    })
}

fn required<'a>(decoded: &'a DecodedRequest, key: &'static str) -> Result<&'a Value, ValidationError> {
    decoded.get(key).ok_or(ValidationError::MissingKey(key))
}

fn validate_method(decoded: &DecodedRequest) -> Result<Method, ValidationError> {
    let name = required(decoded, "method")?
        .as_str()
        .ok_or(ValidationError::WrongType {
            key: "method",
            expected: "a string",
        })?;
    Method::parse(name)
}

fn validate_mandatory_keys(decoded: &DecodedRequest, method: Method) -> Result<(), ValidationError> {
    let mut mandatory = vec!["url", "headers", "method"];
    if method.requires_body() {
        mandatory.push("data");
    }
    match mandatory.into_iter().find(|key| !decoded.contains(key)) {
        Some(missing) => Err(ValidationError::MissingKey(missing)),
        None => Ok(()),
    }
}

/// The url must be absolute with at least a scheme and a host.
fn validate_url(decoded: &DecodedRequest) -> Result<Url, ValidationError> {
    let raw = required(decoded, "url")?
        .as_str()
        .ok_or(ValidationError::WrongType {
            key: "url",
            expected: "a string",
        })?;

    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

fn validate_content_type(headers: &Headers) -> Result<ContentType, ValidationError> {
    match headers.get(ContentType::HEADER) {
        None => Err(ValidationError::MissingContentType),
        Some(None) => Err(ValidationError::UnsupportedContentType("(no value)".to_string())),
        Some(Some(value)) => ContentType::parse(value)
            .ok_or_else(|| ValidationError::UnsupportedContentType(value.to_string())),
    }
}

fn validate_payload(
    data: &Value,
    content_type: ContentType,
    method: Method,
) -> Result<Payload, ValidationError> {
    match content_type {
        ContentType::Json => match data {
            Value::Object(object) => Ok(Payload::Json(object.clone())),
            _ => Err(ValidationError::JsonBodyNotObject),
        },
        ContentType::Text => match data {
            Value::String(text) if text.is_empty() => Err(ValidationError::EmptyBody(method)),
            Value::String(text) => Ok(Payload::Text(text.clone())),
            Value::Null => Err(ValidationError::EmptyBody(method)),
            _ => Err(ValidationError::TextBodyNotString),
        },
    }
}

/// `transform` takes priority over `enrichment`; `null` counts as absent.
fn extract_enrichment(decoded: &DecodedRequest) -> Result<Option<Enrichment>, ValidationError> {
    for key in ENRICHMENT_KEYS {
        match decoded.get(key) {
            None | Some(Value::Null) => continue,
            Some(Value::Object(map)) => return Ok(Some(map.clone())),
            Some(_) => {
                return Err(ValidationError::WrongType {
                    key,
                    expected: "a JSON object",
                })
            }
        }
    }
    Ok(None)
}
