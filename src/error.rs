//! Failures of a device call, end to end.
//!
//! Each variant maps to the HTTP status the device receives:
//!
//! | failure                              | status |
//! |--------------------------------------|--------|
//! | decode, validation                   | 400    |
//! | transform: malformed enrichment      | 400    |
//! | transform: inconsistent entity data  | 500    |
//! | entity store unreachable             | 503    |
//! | entity store bad status / payload    | 502    |
//! | dispatch: bad target url or header   | 400    |
//! | dispatch: broker unreachable         | 503    |
//! | dispatch: broker timeout             | 504    |
//! | dispatch: other transport failure    | 502    |

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::dispatch::DispatchError;
use crate::pipeline::{DecodeError, ValidationError};
use crate::transform::{StoreError, TransformError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Decode(_) | GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Transform(e) => match e {
                TransformError::InvalidEnrichment(_) => StatusCode::BAD_REQUEST,
                TransformError::Inconsistent(_) => StatusCode::INTERNAL_SERVER_ERROR,
                TransformError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
                // a NotFound that escaped the transform is a broken reference
                TransformError::Store(StoreError::NotFound(_))
                | TransformError::Store(StoreError::InvalidEntity(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                TransformError::Store(StoreError::Status { .. })
                | TransformError::Store(StoreError::Decode(_)) => StatusCode::BAD_GATEWAY,
            },
            GatewayError::Dispatch(e) => match e {
                DispatchError::InvalidTarget { .. } | DispatchError::InvalidHeader(_) => {
                    StatusCode::BAD_REQUEST
                }
                DispatchError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                DispatchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                DispatchError::Failed(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// True for failures caused by the device's payload.
    pub fn is_bad_request(&self) -> bool {
        self.status() == StatusCode::BAD_REQUEST
    }
}
