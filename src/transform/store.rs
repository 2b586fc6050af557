//! Read access to the broker's entities.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// A broker entity in NGSI v2 normalized form.
pub type Entity = Value;

/// Errors that can occur while querying the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The entity does not exist. Callers decide whether that is fatal.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// The store could not be reached.
    #[error("entity store unreachable: {0}")]
    Unavailable(String),

    /// The store answered with an unexpected status.
    #[error("entity store returned status {status} for {context}")]
    Status { status: u16, context: String },

    /// The store answered with something that is not an entity.
    #[error("undecodable entity store response: {0}")]
    Decode(String),

    /// An entity handed to `upsert` has no usable id.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),
}

/// Result type for entity store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Entity lookups used by the transform stage.
///
/// Each call is an independent request; nothing is batched or cached.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch an entity by id.
    async fn get(&self, id: &str) -> StoreResult<Entity>;

    /// Whether an entity exists. Only a missing entity yields `false`;
    /// every other failure propagates.
    async fn exists(&self, id: &str) -> StoreResult<bool> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create or overwrite entities. Setup tooling only.
    async fn upsert(&self, entities: Vec<Entity>) -> StoreResult<()>;
}

/// Attribute value of an entity.
///
/// Accepts `{"type": .., "value": x}` as well as a bare `x`.
pub fn attribute<'a>(entity: &'a Value, name: &str) -> Option<&'a Value> {
    let raw = entity.get(name)?;
    match raw {
        Value::Object(attr) if attr.contains_key("value") => attr.get("value"),
        other => Some(other),
    }
}

/// `id` field of an entity.
pub fn entity_id(entity: &Value) -> Option<&str> {
    entity.get("id").and_then(Value::as_str)
}

/// Whether `id` addresses a single entity once placed in a url path.
///
/// Empty ids, `.` and `..` collapse onto the entity collection.
pub fn is_entity_id(id: &str) -> bool {
    !matches!(id.trim(), "" | "." | "..")
}

/// Append path segments to the broker base url.
///
/// Segments are percent-encoded as needed; `:` in URN ids is kept.
pub fn broker_url(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
    Some(url)
}
