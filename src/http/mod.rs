//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! device POST (JSON request description)
//!     → server.rs (Axum setup, request ID, limits)
//!     → pipeline::prepare (decode, validate, build)
//!     → transform::apply
//!     → dispatch.rs (replay against the broker)
//!     → response.rs (relay status/body, or error reply)
//!     → Send to device
//! ```

pub mod dispatch;
pub mod response;
pub mod server;

pub use dispatch::{BrokerResponse, DispatchError, Dispatcher};
pub use server::{AppState, HttpServer};
