//! PLC gateway library.
//!
//! Devices that cannot speak HTTP properly POST a JSON description of the
//! request they want made; the gateway validates it, optionally rewrites it
//! through a transform, replays it against the context broker and relays
//! the answer.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod transform;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{prepare, RequestSpec};
pub use transform::{EntityStore, Transform};
