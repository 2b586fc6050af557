//! Part counter transform.
//!
//! A PLC only knows its workstation and how many machine cycles finished.
//! It sends
//!
//! ```json
//! {"url": "...", "method": "PUT", "headers": [],
//!  "transform": {"ws": "urn:ngsi_ld:Workstation:1", "ct": "good", "cc": 14}}
//! ```
//!
//! and this transform replaces the request with a write of the absolute
//! counter to the workstation's current Job:
//!
//! ```text
//! PUT {broker}/v2/entities/{job}/attrs/GoodPartCounter/value
//! Content-Type: text/plain
//!
//! 112            (14 cycles * 8 parts per cycle)
//! ```
//!
//! Resolution chain: Workstation `RefJob` → Job → current operation
//! (see [`OperationResolution`]) → `PartsPerCycle`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::config::OperationResolution;
use crate::pipeline::{ContentType, Enrichment, Headers, Method, RequestSpec};
use crate::transform::store::{attribute, broker_url, is_entity_id, Entity, EntityStore, StoreError};
use crate::transform::{Transform, TransformError};

pub const GOOD_COUNTER: &str = "GoodPartCounter";
pub const REJECT_COUNTER: &str = "RejectPartCounter";

/// Counter type value selecting [`GOOD_COUNTER`]. Matched exactly.
pub const GOOD: &str = "good";

/// Enrichment keys sent by the PLC.
const WORKSTATION_KEY: &str = "ws";
const COUNTER_TYPE_KEY: &str = "ct";
const CYCLE_COUNT_KEY: &str = "cc";

/// What the PLC asked for, pulled out of the enrichment map.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CounterUpdate {
    workstation: String,
    counter: &'static str,
    cycle_count: u64,
}

impl CounterUpdate {
    fn from_enrichment(enrichment: &Enrichment) -> Result<Self, TransformError> {
        let field = |key: &str| {
            enrichment
                .get(key)
                .ok_or_else(|| TransformError::InvalidEnrichment(format!("missing key '{key}'")))
        };

        let workstation = field(WORKSTATION_KEY)?
            .as_str()
            .filter(|id| is_entity_id(id))
            .ok_or_else(|| {
                TransformError::InvalidEnrichment(format!(
                    "'{WORKSTATION_KEY}' must be a workstation id"
                ))
            })?;
        let counter_type = field(COUNTER_TYPE_KEY)?.as_str().ok_or_else(|| {
            TransformError::InvalidEnrichment(format!("'{COUNTER_TYPE_KEY}' must be a string"))
        })?;
        let cycle_count = field(CYCLE_COUNT_KEY)?.as_u64().ok_or_else(|| {
            TransformError::InvalidEnrichment(format!(
                "'{CYCLE_COUNT_KEY}' must be a non-negative integer"
            ))
        })?;

        Ok(Self {
            workstation: workstation.to_string(),
            counter: if counter_type == GOOD { GOOD_COUNTER } else { REJECT_COUNTER },
            cycle_count,
        })
    }
}

/// Rewrites cycle reports into Job counter updates.
#[derive(Clone)]
pub struct CounterTransform {
    store: Arc<dyn EntityStore>,
    broker_url: Url,
    resolution: OperationResolution,
}

impl CounterTransform {
    /// `broker_url` is the broker base the rewritten request targets.
    pub fn new(store: Arc<dyn EntityStore>, broker_url: Url, resolution: OperationResolution) -> Self {
        Self {
            store,
            broker_url,
            resolution,
        }
    }

    /// Fetch an entity another entity points at; absence means the data is broken.
    async fn fetch_referenced(&self, id: &str) -> Result<Entity, TransformError> {
        match self.store.get(id).await {
            Ok(entity) => Ok(entity),
            Err(StoreError::NotFound(_)) => Err(TransformError::Inconsistent(format!(
                "referenced entity {id} does not exist"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn parts_per_cycle(&self, job_id: &str, job: &Entity) -> Result<u64, TransformError> {
        match self.resolution {
            OperationResolution::PartOperations => {
                let part_id = text_attribute(job, job_id, "RefPart")?;
                let operation_type = text_attribute(job, job_id, "CurrentOperationType")?;
                let part = self.fetch_referenced(part_id).await?;
                tracing::debug!(part = %part_id, operation_type = %operation_type, "Part resolved");

                let operation = current_operation(&part, part_id, operation_type)?;
                count_attribute(operation, part_id, "PartsPerCycle")
            }
            OperationResolution::OperationReference => {
                let operation_id = text_attribute(job, job_id, "RefOperation")?;
                let operation = self.fetch_referenced(operation_id).await?;
                tracing::debug!(operation = %operation_id, "Operation resolved");
                count_attribute(&operation, operation_id, "PartsPerCycle")
            }
        }
    }

    fn counter_url(&self, job_id: &str, counter: &str) -> Result<Url, TransformError> {
        broker_url(
            &self.broker_url,
            &["v2", "entities", job_id, "attrs", counter, "value"],
        )
        .ok_or_else(|| {
            TransformError::Inconsistent(format!(
                "broker url {} cannot be used as a base",
                self.broker_url
            ))
        })
    }
}

#[async_trait]
impl Transform for CounterTransform {
    async fn transform(&self, spec: RequestSpec) -> Result<RequestSpec, TransformError> {
        let update = match spec.enrichment.as_ref() {
            Some(enrichment) if !enrichment.is_empty() => CounterUpdate::from_enrichment(enrichment)?,
            _ => return Ok(spec),
        };
        tracing::debug!(
            workstation = %update.workstation,
            counter = update.counter,
            cycle_count = update.cycle_count,
            "Counter update requested"
        );

        let workstation = match self.store.get(&update.workstation).await {
            Ok(entity) => entity,
            Err(StoreError::NotFound(_)) => {
                tracing::warn!(
                    workstation = %update.workstation,
                    "Workstation does not exist, request left unchanged"
                );
                return Ok(spec);
            }
            Err(e) => return Err(e.into()),
        };
        let job_id = text_attribute(&workstation, &update.workstation, "RefJob")?;
        let job = self.fetch_referenced(job_id).await?;
        let parts_per_cycle = self.parts_per_cycle(job_id, &job).await?;

        let counter_value = update
            .cycle_count
            .checked_mul(parts_per_cycle)
            .ok_or_else(|| {
                TransformError::Inconsistent(format!(
                    "counter overflow: {} cycles * {parts_per_cycle} parts per cycle",
                    update.cycle_count
                ))
            })?;
        tracing::debug!(job = %job_id, parts_per_cycle, counter_value, "Counter computed");

        let mut headers = Headers::new();
        headers.insert(ContentType::HEADER, Some(ContentType::Text.as_str().to_string()));

        Ok(RequestSpec {
            url: self.counter_url(job_id, update.counter)?,
            method: Method::Put,
            headers,
            body: Some(counter_value.to_string()),
            enrichment: None,
        })
    }
}

/// Find the operation of `part` whose `OperationType` matches.
fn current_operation<'a>(
    part: &'a Entity,
    part_id: &str,
    operation_type: &str,
) -> Result<&'a Value, TransformError> {
    let operations = attribute(part, "Operations")
        .and_then(Value::as_array)
        .ok_or_else(|| missing_attribute(part_id, "Operations"))?;

    operations
        .iter()
        .find(|op| attribute(op, "OperationType").and_then(Value::as_str) == Some(operation_type))
        .ok_or_else(|| {
            TransformError::Inconsistent(format!(
                "the job's current operation {operation_type} is not found in part {part_id}"
            ))
        })
}

fn text_attribute<'a>(entity: &'a Entity, id: &str, name: &str) -> Result<&'a str, TransformError> {
    attribute(entity, name)
        .and_then(Value::as_str)
        .ok_or_else(|| missing_attribute(id, name))
}

fn count_attribute(entity: &Value, id: &str, name: &str) -> Result<u64, TransformError> {
    attribute(entity, name)
        .and_then(Value::as_u64)
        .ok_or_else(|| missing_attribute(id, name))
}

fn missing_attribute(id: &str, name: &str) -> TransformError {
    TransformError::Inconsistent(format!("{id} has no usable '{name}' attribute"))
}
