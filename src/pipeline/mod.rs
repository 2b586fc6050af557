//! Device payload decoding, validation and request building.
//!
//! # Data Flow
//! ```text
//! raw bytes (device POST body)
//!     → decode.rs   (JSON object, normalized keys, method/url cleanup)
//!     → validate.rs (method, mandatory keys, url, headers, content type)
//!     → build.rs    (body serialization, Content-Length)
//!     → RequestSpec (ready for the transform stage and dispatch)
//! ```
//!
//! # Design Decisions
//! - Every stage is a pure function; nothing here touches the network
//! - Validation fails fast with the first violated rule
//! - No state survives between calls

pub mod build;
pub mod decode;
pub mod error;
pub mod spec;
pub mod validate;

pub use error::{DecodeError, ValidationError};
pub use spec::{ContentType, Enrichment, Headers, Method, Payload, RequestSpec};

use crate::error::GatewayError;

/// Run decode, validate and build over one device payload.
pub fn prepare(raw: &[u8]) -> Result<RequestSpec, GatewayError> {
    let decoded = decode::decode(raw)?;
    let validated = validate::validate(&decoded)?;
    Ok(build::build(validated))
}
