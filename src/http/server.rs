//! Host server used by the harness binary.
//!
//! # Responsibilities
//! - Serve files under `/base` from the configured base path
//! - Put the dev server middleware in front of every route
//! - Bind server to listener and shut down on `Exit`

use std::sync::Arc;

use axum::{http::StatusCode, middleware, Router};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::HostConfig;
use crate::http::middleware::{esm_middleware, EsmRouter};
use crate::lifecycle::{signals::shutdown_signal, Emitter};

/// HTTP server standing in for the test runner.
pub struct HostServer {
    router: Router,
    emitter: Emitter,
}

impl HostServer {
    pub fn new(config: &HostConfig, esm: Arc<EsmRouter>, emitter: Emitter) -> Self {
        Self {
            router: Self::build_router(config, esm),
            emitter,
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &HostConfig, esm: Arc<EsmRouter>) -> Router {
        Router::new()
            .nest_service("/base", ServeDir::new(&config.base_path))
            .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
            .layer(middleware::from_fn_with_state(esm, esm_middleware))
            // 502s from swallowed proxy errors must stay quiet
            .layer(TraceLayer::new_for_http().on_failure(()))
    }

    /// Run the server until `Exit` is emitted or Ctrl+C is pressed.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Host server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(self.emitter))
            .await?;

        tracing::info!("Host server stopped");
        Ok(())
    }
}
