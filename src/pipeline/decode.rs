//! Raw bytes to a normalized JSON object.
//!
//! # Responsibilities
//! - Parse the device payload as a single JSON object
//! - Trim and lower-case every top-level key (later keys win on collision)
//! - Trim and upper-case `method`, trim `url`
//! - Split `"Name: Value"` header lines into [`Headers`]
//!
//! # Design Decisions
//! - Decoding never rejects a field's *content*; that is the validator's job
//! - Key order of the original document is kept so collisions resolve in
//!   document order

use serde_json::{Map, Value};

use crate::pipeline::error::{json_kind, DecodeError, ValidationError};
use crate::pipeline::spec::Headers;

/// Keys that carry opaque transform input, in lookup priority.
pub const ENRICHMENT_KEYS: [&str; 2] = ["transform", "enrichment"];

/// A device payload with normalized keys, not yet trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRequest {
    fields: Map<String, Value>,
}

impl DecodedRequest {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}

/// Decode raw bytes into a [`DecodedRequest`].
pub fn decode(raw: &[u8]) -> Result<DecodedRequest, DecodeError> {
    let parsed: Value = serde_json::from_slice(raw)?;
    let object = match parsed {
        Value::Object(object) => object,
        other => return Err(DecodeError::NotAnObject(json_kind(&other))),
    };

    let mut fields = Map::with_capacity(object.len());
    for (key, value) in object {
        fields.insert(key.trim().to_lowercase(), value);
    }

    if let Some(Value::String(method)) = fields.get_mut("method") {
        *method = method.trim().to_uppercase();
    }
    if let Some(Value::String(url)) = fields.get_mut("url") {
        *url = url.trim().to_string();
    }

    Ok(DecodedRequest { fields })
}

/// Split one header line into name and optional value.
///
/// `"Name: Value"` and bare `"Name"` are accepted; a second `:` makes the
/// line ambiguous and is rejected.
pub fn parse_header_line(line: &str) -> Result<(String, Option<String>), ValidationError> {
    let parts: Vec<&str> = line.split(':').map(str::trim).collect();
    let (name, value) = match parts.as_slice() {
        [name] => (*name, None),
        [name, value] => (*name, Some(value.to_string())),
        _ => return Err(ValidationError::MalformedHeader(line.to_string())),
    };
    if name.is_empty() {
        return Err(ValidationError::MalformedHeader(line.to_string()));
    }
    Ok((name.to_string(), value))
}

/// Turn the `headers` array into a [`Headers`] map.
pub fn extract_headers(value: &Value) -> Result<Headers, ValidationError> {
    let lines = value.as_array().ok_or(ValidationError::WrongType {
        key: "headers",
        expected: "a list of strings",
    })?;

    let mut headers = Headers::new();
    for line in lines {
        let line = line
            .as_str()
            .ok_or_else(|| ValidationError::MalformedHeader(line.to_string()))?;
        let (name, value) = parse_header_line(line)?;
        headers.insert(name, value);
    }
    Ok(headers)
}
