//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the device and health handlers
//! - Wire up middleware (tracing, limits, timeout, request ID)
//! - Bind server to listener
//! - Run each device payload through pipeline → transform → dispatch

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    map_response_body::MapResponseBodyLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::dispatch::{build_client, BrokerResponse, Dispatcher};
use crate::http::response;
use crate::observability::metrics;
use crate::pipeline::{self, RequestSpec};
use crate::transform::{self, EntityStore, OrionStore, Transform};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub transform: Arc<dyn Transform>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server talking to the configured broker.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(&config.broker)?;
        let store: Arc<dyn EntityStore> =
            Arc::new(OrionStore::new(client.clone(), config.broker.base_url.clone()));
        let state = AppState {
            dispatcher: Dispatcher::new(client),
            transform: transform::from_config(&config.transform, &config.broker, store),
        };
        Ok(Self::with_state(config, state))
    }

    /// Create a server with a prepared state (custom transform or store).
    pub fn with_state(config: GatewayConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(health_handler).post(gateway_handler))
            .route("/{*path}", get(health_handler).post(gateway_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.limits.request_timeout_secs,
                    )))
                    .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_size)),
            )
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            broker = %self.config.broker.base_url,
            transform_enabled = self.config.transform.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn health_handler() -> Response {
    response::health()
}

/// Device entry point: the POST body is the request description.
async fn gateway_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::info!(request_id = %request_id, bytes = body.len(), "Device request received");

    let spec = match pipeline::prepare(&body) {
        Ok(spec) => spec,
        Err(e) => return reply_error(&request_id, "-", e, start_time),
    };
    tracing::info!(
        request_id = %request_id,
        method = %spec.method,
        url = %spec.url,
        enrichment = spec.has_enrichment(),
        "Request decoded"
    );

    let method = spec.method.as_str();
    match forward(&state, spec).await {
        Ok(broker_response) => {
            metrics::record_request(method, broker_response.status.as_u16(), start_time);
            response::relay(broker_response)
        }
        Err(e) => reply_error(&request_id, method, e, start_time),
    }
}

/// Transform, then dispatch.
async fn forward(state: &AppState, spec: RequestSpec) -> Result<BrokerResponse, GatewayError> {
    let spec = transform::apply(state.transform.as_ref(), spec).await?;
    Ok(state.dispatcher.send(&spec).await?)
}

fn reply_error(request_id: &str, method: &str, error: GatewayError, start_time: Instant) -> Response {
    let status = error.status();
    if error.is_bad_request() {
        tracing::warn!(request_id = %request_id, status = %status, error = %error, "Bad request");
    } else {
        tracing::error!(request_id = %request_id, status = %status, error = %error, "Request failed");
    }
    metrics::record_request(method, status.as_u16(), start_time);
    axum::response::IntoResponse::into_response(error)
}
