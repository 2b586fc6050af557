//! Builder-ready request representation.
//!
//! A [`RequestSpec`] is created fresh for every device call, flows through
//! the transform stage and is dropped after dispatch.

use serde_json::{Map, Value};
use std::fmt;
use url::Url;

use crate::pipeline::error::ValidationError;

/// Every method name the validator recognizes as HTTP.
pub const KNOWN_METHODS: [&str; 8] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE",
];

/// Opaque per-request data consumed only by the transform stage.
pub type Enrichment = Map<String, Value>;

/// HTTP methods the gateway can replay against the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Parse an already upper-cased method name.
    ///
    /// Names outside [`KNOWN_METHODS`] are invalid; known names the gateway
    /// does not replay (HEAD, CONNECT, OPTIONS, TRACE) are unimplemented.
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        match name {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other if KNOWN_METHODS.contains(&other) => {
                Err(ValidationError::UnimplementedMethod(other.to_string()))
            }
            other => Err(ValidationError::InvalidMethod(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// POST and PUT carry a body; GET and DELETE never do.
    pub fn requires_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body encodings accepted for POST and PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Text,
}

impl ContentType {
    pub const HEADER: &'static str = "Content-Type";

    /// Exact match only: no parameters, no case folding.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "application/json" => Some(ContentType::Json),
            "text/plain" => Some(ContentType::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain",
        }
    }
}

/// Validated body, before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Map<String, Value>),
    Text(String),
}

/// Ordered header list with case-insensitive, last-write-wins names.
///
/// A `None` value marks a bare header name sent without a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Option<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any entry whose name matches ignoring case.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a header. The outer `Option` is presence, the inner one the value.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.position(name)
            .map(|idx| self.entries[idx].1.as_deref())
    }

    pub fn remove(&mut self, name: &str) -> Option<Option<String>> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<N: Into<String>> FromIterator<(N, Option<String>)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, Option<String>)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// The outbound HTTP call described by a device payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub url: Url,
    pub method: Method,
    pub headers: Headers,
    /// Serialized body, present only for POST and PUT.
    pub body: Option<String>,
    /// `None` means no enrichment was requested; `Some` of an empty map
    /// means it was requested but carries nothing.
    pub enrichment: Option<Enrichment>,
}

impl RequestSpec {
    /// True when the transform stage has anything to work with.
    pub fn has_enrichment(&self) -> bool {
        self.enrichment.as_ref().is_some_and(|map| !map.is_empty())
    }
}
