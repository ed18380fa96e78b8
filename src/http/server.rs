//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the firewall middleware in front
//! - Forward admitted requests to the upstream, or serve the demo routes
//! - Wire up tower-http layers (trace, request ID, timeout)
//! - Run the rate limiter sweep and the admin listener alongside
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, AdminState};
use crate::audit::{AuditSink, JsonLinesSink, QueuedSink};
use crate::config::FirewallConfig;
use crate::http::middleware::firewall_middleware;
use crate::pipeline::AdmissionPipeline;
use crate::security::SlidingWindowLimiter;
use crate::signatures::{CatalogError, SignatureCatalog};

/// Failure to assemble the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("signature catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("invalid upstream address {0:?}")]
    InvalidUpstream(String),
}

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AdmissionPipeline>,
    pub client: Client<HttpConnector, Body>,
    pub upstream: Option<Authority>,
    pub trust_forwarded_for: bool,
}

/// HTTP server for the firewall.
pub struct HttpServer {
    router: Router,
    config: FirewallConfig,
    pipeline: Arc<AdmissionPipeline>,
    started_at: Instant,
}

impl HttpServer {
    /// Create a server writing audit records to the configured file.
    ///
    /// Must be called from within a Tokio runtime when auditing is enabled.
    pub fn new(config: FirewallConfig) -> Result<Self, ServerError> {
        let audit: Option<Arc<dyn AuditSink>> = if config.audit.enabled {
            let file = Arc::new(JsonLinesSink::new(&config.audit.path));
            Some(Arc::new(QueuedSink::spawn(file, config.audit.queue_capacity)))
        } else {
            None
        };
        Self::with_audit(config, audit)
    }

    /// Create a server with an explicit audit sink.
    pub fn with_audit(
        config: FirewallConfig,
        audit: Option<Arc<dyn AuditSink>>,
    ) -> Result<Self, ServerError> {
        let catalog = Arc::new(SignatureCatalog::from_config(&config.signatures)?);
        let limiter = Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit));
        let pipeline = Arc::new(AdmissionPipeline::new(&config, catalog, limiter, audit));

        let upstream = match &config.upstream.address {
            Some(address) => Some(
                Authority::from_str(address)
                    .map_err(|_| ServerError::InvalidUpstream(address.clone()))?,
            ),
            None => None,
        };

        let state = AppState {
            pipeline: pipeline.clone(),
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
            upstream,
            trust_forwarded_for: config.listener.trust_forwarded_for,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            pipeline,
            started_at: Instant::now(),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &FirewallConfig, state: AppState) -> Router {
        let routes = if state.upstream.is_some() {
            Router::new().fallback(proxy_handler)
        } else {
            Router::new()
                .route("/", get(home))
                .route("/test", post(test_endpoint))
                .route("/graphql", post(graphql_endpoint))
        };

        routes
            .layer(middleware::from_fn_with_state(state.clone(), firewall_middleware))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = ?self.config.upstream.address,
            "Firewall listening"
        );

        spawn_sweeper(
            self.pipeline.limiter().clone(),
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
            shutdown.resubscribe(),
        );

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_state = AdminState {
                pipeline: self.pipeline.clone(),
                api_key: self.config.admin.api_key.clone(),
                started_at: self.started_at,
            };
            let admin_app = setup_admin_router(admin_state);
            let mut admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin_app)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin server failed");
                }
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &FirewallConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<AdmissionPipeline> {
        &self.pipeline
    }
}

/// Periodically evict idle rate-limit windows until shutdown.
fn spawn_sweeper(
    limiter: Arc<SlidingWindowLimiter>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = limiter.sweep(Instant::now());
                    if evicted > 0 {
                        tracing::debug!(evicted, tracked = limiter.tracked_clients(), "Rate limiter swept");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    });
}

/// Forward an admitted request to the upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let Some(authority) = state.upstream.clone() else {
        return (StatusCode::NOT_FOUND, "No upstream configured").into_response();
    };

    let (mut parts, body) = request.into_parts();
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(authority);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(error = %e, "Could not build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

async fn home() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "API Firewall is active and monitoring traffic."
    }))
}

#[derive(Debug, Deserialize)]
struct TestRequest {
    message: String,
}

async fn test_endpoint(Json(data): Json<TestRequest>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "received_message": data.message }))
}

/// Canned resolver for the demo `user` query.
async fn graphql_endpoint() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "data": {
            "user": { "id": 1, "name": "John Doe", "email": "john@example.com" }
        }
    }))
}
