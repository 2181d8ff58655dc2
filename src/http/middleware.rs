//! Middleware that hands module requests to the dev server.
//!
//! # Responsibilities
//! - Derive settings and start the dev server once, at construction
//! - Wait for startup before routing a request
//! - Forward dev server paths, pass everything else to the next handler
//! - Report setup and routing failures to the diagnostic sink
//!
//! # Design Decisions
//! - Construction is synchronous; startup continues in the background
//! - Local requests reach `next` even when startup failed
//! - Errors are reported, then returned; the host decides what to do

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::HostConfig;
use crate::dev_server::{
    DevServerCell, DevServerLauncher, LaunchRequest, ProcessLauncher, SetupError,
};
use crate::http::forward::Forwarder;
use crate::lifecycle::Emitter;
use crate::observability::{Diagnostics, TracingDiagnostics};
use crate::routing::{Decision, RoutingRules};
use crate::transform::create_esm_config;

/// Context attached to construction failures.
pub const SETUP_CONTEXT: &str = "Error while setting up es-dev-server middleware";

/// Context attached to per-request failures.
pub const PROXY_CONTEXT: &str = "Error while proxying to es-dev-server";

/// Error type for a single routing decision.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("dev server unavailable: {0}")]
    DevServer(#[source] Arc<SetupError>),

    #[error("invalid proxy target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, PROXY_CONTEXT).into_response()
    }
}

/// Routes requests between the dev server and the host.
pub struct EsmRouter {
    rules: RoutingRules,
    server: DevServerCell,
    forwarder: Forwarder,
    diagnostics: Arc<dyn Diagnostics>,
}

impl EsmRouter {
    /// Build the router and start the dev server in the background.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        config: HostConfig,
        emitter: Emitter,
        launcher: Arc<dyn DevServerLauncher>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, SetupError> {
        Self::build(config, emitter, launcher, diagnostics.clone()).map_err(|e| {
            diagnostics.error(SETUP_CONTEXT, &e);
            e
        })
    }

    /// Run the configured dev server command and log through `tracing`.
    pub fn with_process_launcher(config: HostConfig, emitter: Emitter) -> Result<Self, SetupError> {
        Self::new(
            config,
            emitter,
            Arc::new(ProcessLauncher),
            Arc::new(TracingDiagnostics),
        )
    }

    fn build(
        config: HostConfig,
        emitter: Emitter,
        launcher: Arc<dyn DevServerLauncher>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, SetupError> {
        let watch = config.auto_watch;
        let (settings, transform) = create_esm_config(&config)?;
        let rules = RoutingRules::new(config.snapshot.resolver().as_ref());

        tracing::debug!(
            snapshot_path = rules.snapshot_path(),
            watch,
            "Starting es-dev-server middleware"
        );

        let request = LaunchRequest {
            config,
            settings,
            watch,
            transform,
            emitter,
        };
        let server = DevServerCell::start(launcher, request, diagnostics.clone())?;

        Ok(Self {
            rules,
            server,
            forwarder: Forwarder::new(),
            diagnostics,
        })
    }

    pub fn rules(&self) -> &RoutingRules {
        &self.rules
    }

    pub fn server(&self) -> &DevServerCell {
        &self.server
    }

    /// Route one request. `next` runs the rest of the host pipeline.
    pub async fn route<F, Fut>(
        &self,
        request: Request<Body>,
        next: F,
    ) -> Result<Response, RouteError>
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Response>,
    {
        let server = self.server.resolve().await;

        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let decision = self.rules.decide(target);
        tracing::debug!(target, ?decision, "Routing request");

        match decision {
            Decision::Local => Ok(next(request).await),
            Decision::Forward => {
                let result = match server {
                    Ok(handle) => self.forwarder.forward(&handle, request).await,
                    Err(err) => Err(RouteError::DevServer(err)),
                };
                result.map_err(|e| {
                    self.diagnostics.error(PROXY_CONTEXT, &e);
                    e
                })
            }
        }
    }
}

impl std::fmt::Debug for EsmRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EsmRouter")
            .field("rules", &self.rules)
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

/// Axum middleware entry point.
///
/// Install with `axum::middleware::from_fn_with_state(router, esm_middleware)`.
pub async fn esm_middleware(
    State(router): State<Arc<EsmRouter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, RouteError> {
    router.route(request, |req| next.run(req)).await
}
