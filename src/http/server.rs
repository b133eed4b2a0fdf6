//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that funnels every request into [`App::dispatch`]
//! - Wire up middleware (tracing, timeout, request ID)
//! - Buffer request bodies up to the configured limit
//! - Bind server to listener and shut down gracefully
//!
//! # Design Decisions
//! - No Axum routes: a single fallback handler owns all paths and methods
//! - Handler chains are synchronous; each runs on a blocking task so a slow
//!   handler cannot stall the runtime and a panic stays inside its request

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request as AxumRequest, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::engine::App;
use crate::http::request::{MakeRequestUuidV4, Request};
use crate::lifecycle::shutdown_signal;

/// State injected into the dispatch handler.
#[derive(Clone)]
struct DispatchState {
    app: Arc<App>,
    max_body_size: usize,
}

/// HTTP front end for a built [`App`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(app: impl Into<Arc<App>>, config: ServerConfig) -> Self {
        let state = DispatchState {
            app: app.into(),
            max_body_size: config.limits.max_body_size,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: DispatchState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered service, e.g. for driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve until `shutdown` fires or the process receives SIGINT/SIGTERM.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(state): State<DispatchState>, request: AxumRequest) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                path = %parts.uri.path(),
                limit = state.max_body_size,
                error = %e,
                "Rejected request body"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    let request = Request::from_parts(parts, body);
    let app = state.app.clone();
    match tokio::task::spawn_blocking(move || app.dispatch(request)).await {
        Ok(writer) => writer.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
