//! Replies to the device.
//!
//! # Responsibilities
//! - Relay the broker's status and body unchanged
//! - Map gateway failures to a status and a diagnosable text body
//!
//! # Design Decisions
//! - Replies are `text/plain` unless the broker declared a content type
//! - Device-side failures start with "Error processing request.",
//!   downstream failures with "Connection error."

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::http::dispatch::BrokerResponse;

const TEXT_PLAIN: &str = "text/plain";

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let prefix = if status.is_client_error() || status == StatusCode::INTERNAL_SERVER_ERROR {
            "Error processing request."
        } else {
            "Connection error."
        };
        text(status, format!("{prefix}\n{self}"))
    }
}

/// Pass the broker's answer through.
pub fn relay(response: BrokerResponse) -> Response {
    let content_type = response
        .content_type
        .unwrap_or_else(|| HeaderValue::from_static(TEXT_PLAIN));
    (
        response.status,
        [(header::CONTENT_TYPE, content_type)],
        Body::from(response.body),
    )
        .into_response()
}

/// Liveness banner served on GET.
pub fn health() -> Response {
    text(
        StatusCode::OK,
        format!("plc-gateway running.\nversion: {}", env!("CARGO_PKG_VERSION")),
    )
}

fn text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN))],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::dispatch::DispatchError;
    use crate::pipeline::ValidationError;
    use axum::body::{to_bytes, Bytes};

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_reply_names_the_field() {
        let response = GatewayError::from(ValidationError::MissingKey("headers")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_PLAIN);

        let body = body_text(response).await;
        assert!(body.starts_with("Error processing request.\n"));
        assert!(body.contains("'headers'"));
    }

    #[tokio::test]
    async fn test_gateway_reply() {
        let response = GatewayError::from(DispatchError::Unavailable("refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_text(response).await.starts_with("Connection error.\n"));
    }

    #[tokio::test]
    async fn test_relay_keeps_status_and_body() {
        let response = relay(BrokerResponse {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            content_type: Some(HeaderValue::from_static("application/json")),
            body: Bytes::from_static(br#"{"error":"Unprocessable"}"#),
        });
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_text(response).await, r#"{"error":"Unprocessable"}"#);

        let response = relay(BrokerResponse {
            status: StatusCode::NO_CONTENT,
            content_type: None,
            body: Bytes::new(),
        });
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_PLAIN);
    }
}
