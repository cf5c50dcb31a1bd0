//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a catch-all relay handler
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::proxy::{ReqwestUpstreamClient, UpstreamClient};
use crate::routing::Router as RelayRouter;

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server that reaches the upstream over `reqwest`.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let client = ReqwestUpstreamClient::new(&config.timeouts)?;
        Ok(Self::with_client(config, client))
    }

    /// Create a server around any upstream client.
    pub fn with_client<C: UpstreamClient>(config: RelayConfig, client: C) -> Self {
        let relay = Arc::new(RelayRouter::new(&config, client));
        let router = Self::build_router(&config, relay);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<C: UpstreamClient>(config: &RelayConfig, relay: Arc<RelayRouter<C>>) -> Router {
        Router::new()
            .route("/{*path}", any(relay_handler::<C>))
            .route("/", any(relay_handler::<C>))
            .with_state(relay)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The Axum router, for serving in-process.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.origin,
            prefix = %self.config.upstream.path_prefix,
            strip_prefix = self.config.upstream.strip_prefix,
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
}

/// Catch-all handler; the relay router decides what to do.
async fn relay_handler<C: UpstreamClient>(
    State(relay): State<Arc<RelayRouter<C>>>,
    request: Request<Body>,
) -> Response<Body> {
    relay.route(request).await
}
