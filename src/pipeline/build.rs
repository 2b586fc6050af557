//! Validated payload to a dispatch-ready [`RequestSpec`].
//!
//! The builder is a pure function: no I/O, no failure modes.

use serde_json::{Map, Value};

use crate::pipeline::spec::{Payload, RequestSpec};
use crate::pipeline::validate::ValidatedRequest;

/// Spelling a device uses for the broker's increment operator, which it
/// cannot emit itself.
pub const INC_PLACEHOLDER: &str = "dinc";

/// The broker's increment operator.
pub const INC_OPERATOR: &str = "$inc";

pub const CONTENT_LENGTH: &str = "Content-Length";

/// Build the outbound request.
///
/// GET and DELETE carry no body and no `Content-Length`. POST and PUT get
/// their body serialized per content type and a freshly computed
/// `Content-Length`; any client-supplied value is discarded.
pub fn build(validated: ValidatedRequest) -> RequestSpec {
    let ValidatedRequest {
        url,
        method,
        mut headers,
        payload,
        enrichment,
    } = validated;

    headers.remove(CONTENT_LENGTH);
    let body = payload.map(encode_payload);
    if let Some(body) = &body {
        headers.insert(CONTENT_LENGTH, Some(body.len().to_string()));
    }

    RequestSpec {
        url,
        method,
        headers,
        body,
        enrichment,
    }
}

fn encode_payload(payload: Payload) -> String {
    match payload {
        Payload::Json(object) => rewrite_placeholder_keys(Value::Object(object)).to_string(),
        Payload::Text(text) => rewrite_placeholder_text(&text),
    }
}

/// Rename every object key equal to [`INC_PLACEHOLDER`] to [`INC_OPERATOR`].
///
/// Only keys are touched; string values spelled `dinc` are user data.
pub fn rewrite_placeholder_keys(value: Value) -> Value {
    match value {
        Value::Object(object) => {
            let mut renamed = Map::with_capacity(object.len());
            for (key, inner) in object {
                let key = if key == INC_PLACEHOLDER {
                    INC_OPERATOR.to_string()
                } else {
                    key
                };
                renamed.insert(key, rewrite_placeholder_keys(inner));
            }
            Value::Object(renamed)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(rewrite_placeholder_keys).collect()),
        other => other,
    }
}

/// Text bodies are opaque, so the quoted token is substituted textually.
pub fn rewrite_placeholder_text(text: &str) -> String {
    text.replace(
        &format!("\"{INC_PLACEHOLDER}\""),
        &format!("\"{INC_OPERATOR}\""),
    )
}
