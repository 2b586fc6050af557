//! Entity store backed by the broker's NGSI v2 HTTP API.
//!
//! # Endpoints
//! - `GET  {base}/v2/entities/{id}` → entity, 404 when absent
//! - `POST {base}/v2/op/update`     → bulk append, 204 on success

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use url::Url;

use crate::observability::metrics;
use crate::transform::store::{broker_url, is_entity_id, Entity, EntityStore, StoreError, StoreResult};

/// HTTP entity store. Timeouts come from the shared [`Client`].
#[derive(Clone)]
pub struct OrionStore {
    client: Client,
    base_url: Url,
}

impl OrionStore {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        broker_url(&self.base_url, segments).ok_or_else(|| {
            StoreError::Unavailable(format!("broker url {} cannot be used as a base", self.base_url))
        })
    }
}

impl std::fmt::Debug for OrionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrionStore")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

fn unreachable(url: &Url, error: reqwest::Error) -> StoreError {
    StoreError::Unavailable(format!("{url}: {error}"))
}

#[async_trait]
impl EntityStore for OrionStore {
    async fn get(&self, id: &str) -> StoreResult<Entity> {
        if !is_entity_id(id) {
            return Err(StoreError::InvalidEntity(format!("'{id}' is not an entity id")));
        }
        metrics::record_store_lookup("get");
        let url = self.endpoint(&["v2", "entities", id])?;
        tracing::debug!(url = %url, "Fetching entity");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| unreachable(&url, e))?;

        match response.status() {
            StatusCode::OK => response
                .json::<Entity>()
                .await
                .map_err(|e| StoreError::Decode(format!("GET {url}: {e}"))),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            status => Err(StoreError::Status {
                status: status.as_u16(),
                context: format!("GET {url}"),
            }),
        }
    }

    async fn upsert(&self, entities: Vec<Entity>) -> StoreResult<()> {
        metrics::record_store_lookup("upsert");
        let url = self.endpoint(&["v2", "op", "update"])?;
        let count = entities.len();
        let payload = json!({"actionType": "append", "entities": entities});

        let response = self
            .client
            .post(url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| unreachable(&url, e))?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                tracing::info!(count, "Entities upserted");
                Ok(())
            }
            status => Err(StoreError::Status {
                status: status.as_u16(),
                context: format!("POST {url}"),
            }),
        }
    }
}
