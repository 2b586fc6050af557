//! Optional request rewriting between build and dispatch.
//!
//! # Data Flow
//! ```text
//! RequestSpec (from pipeline)
//!     → apply()          (empty enrichment: returned untouched, no lookups)
//!     → Transform impl   (Passthrough, or CounterTransform)
//!         → EntityStore  (orion.rs over HTTP, memory.rs in-process)
//!     → RequestSpec (to dispatch)
//! ```
//!
//! # Design Decisions
//! - One active implementation, chosen once at startup from config
//! - Implementations receive their broker settings through the constructor
//! - Store "not found" on the entry entity is not an error; unreachable is

pub mod counter;
pub mod memory;
pub mod orion;
pub mod store;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{BrokerConfig, TransformConfig};
use crate::observability::metrics;
use crate::pipeline::RequestSpec;

pub use counter::CounterTransform;
pub use memory::MemoryStore;
pub use orion::OrionStore;
pub use store::{Entity, EntityStore, StoreError, StoreResult};

/// Errors raised by a transform.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The enrichment map lacks a key or carries the wrong type.
    #[error("invalid enrichment: {0}")]
    InvalidEnrichment(String),

    /// The broker's entities do not fit together.
    #[error("inconsistent entity data: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A request rewriting step.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Rewrite a request. Implementations must return the input unchanged,
    /// without querying anything, when it carries no enrichment.
    async fn transform(&self, spec: RequestSpec) -> Result<RequestSpec, TransformError>;
}

/// The default transform: returns every request as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl Transform for Passthrough {
    async fn transform(&self, spec: RequestSpec) -> Result<RequestSpec, TransformError> {
        Ok(spec)
    }
}

/// Run the active transform, enforcing the empty-enrichment short-circuit.
pub async fn apply(transform: &dyn Transform, spec: RequestSpec) -> Result<RequestSpec, TransformError> {
    if !spec.has_enrichment() {
        metrics::record_transform("skipped");
        return Ok(spec);
    }

    let original = spec.clone();
    match transform.transform(spec).await {
        Ok(transformed) => {
            if transformed == original {
                metrics::record_transform("unchanged");
            } else {
                metrics::record_transform("rewritten");
                tracing::info!(
                    method = %transformed.method,
                    url = %transformed.url,
                    "Request transformed"
                );
            }
            Ok(transformed)
        }
        Err(e) => {
            metrics::record_transform("failed");
            Err(e)
        }
    }
}

/// Select the transform for this process.
pub fn from_config(
    transform: &TransformConfig,
    broker: &BrokerConfig,
    store: Arc<dyn EntityStore>,
) -> Arc<dyn Transform> {
    if transform.enabled {
        tracing::info!(resolution = ?transform.resolution, "Counter transform enabled");
        Arc::new(CounterTransform::new(store, broker.base_url.clone(), transform.resolution))
    } else {
        tracing::info!("No transform configured, requests pass through");
        Arc::new(Passthrough)
    }
}
