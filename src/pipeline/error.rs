//! Decode and validation failures.
//!
//! Both are caller mistakes and surface as bad-request replies.

use thiserror::Error;

use crate::pipeline::spec::Method;

/// The inbound bytes are not a single JSON object.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("the sent data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("the sent data does not contain a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// The decoded object breaks one of the request rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the decoded JSON does not include the key '{0}'")]
    MissingKey(&'static str),

    #[error("the key '{key}' must be {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },

    #[error("not a valid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("not implemented HTTP method: {0}")]
    UnimplementedMethod(String),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("the header \"{0}\" is not of the form \"Name: Value\" or \"Name\"")]
    MalformedHeader(String),

    #[error("missing header: \"Content-Type: application/json\" or \"Content-Type: text/plain\"")]
    MissingContentType,

    #[error("unsupported Content-Type: {0}; supported: \"application/json\", \"text/plain\"")]
    UnsupportedContentType(String),

    #[error("Content-Type is application/json, but 'data' is not a JSON object")]
    JsonBodyNotObject,

    #[error("Content-Type is text/plain, but 'data' is not a string")]
    TextBodyNotString,

    #[error("the request has method {0}, but 'data' is empty")]
    EmptyBody(Method),
}

/// Short JSON type name for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
