//! In-process entity store.
//!
//! Backs tests and offline setup. Counts every lookup so callers can
//! assert that no query was made.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::transform::store::{entity_id, Entity, EntityStore, StoreError, StoreResult};

#[derive(Clone, Default)]
pub struct MemoryStore {
    entities: Arc<DashMap<String, Entity>>,
    lookups: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with entities. Entities without an id are skipped.
    pub fn with_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let store = Self::new();
        for entity in entities {
            if let Some(id) = entity_id(&entity).map(str::to_string) {
                store.entities.insert(id, entity);
            }
        }
        store
    }

    /// Number of `get`/`exists` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, id: &str) -> StoreResult<Entity> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.entities
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn upsert(&self, entities: Vec<Entity>) -> StoreResult<()> {
        // validate first so a bad batch changes nothing
        let mut keyed = Vec::with_capacity(entities.len());
        for entity in entities {
            let id = entity_id(&entity)
                .ok_or_else(|| StoreError::InvalidEntity(format!("missing \"id\" in {entity}")))?
                .to_string();
            keyed.push((id, entity));
        }
        for (id, entity) in keyed {
            self.entities.insert(id, entity);
        }
        Ok(())
    }
}
