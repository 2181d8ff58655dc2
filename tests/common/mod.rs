//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, Uri},
    middleware,
    routing::any,
    Router,
};
use esm_proxy::dev_server::{DevServerLauncher, LaunchError, LaunchRequest, ServerHandle};
use esm_proxy::{esm_middleware, EsmRouter};
use futures_util::future::{BoxFuture, FutureExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower::ServiceExt;

/// Start a dev server stand-in that echoes what it received.
///
/// Responds `dev:<METHOD> <uri>[ <body>]`; `/missing.js` is a 404.
pub async fn start_mock_dev_server() -> SocketAddr {
    let app = Router::new()
        .route("/missing.js", any(|| async { (StatusCode::NOT_FOUND, "missing") }))
        .fallback(|method: Method, uri: Uri, body: String| async move {
            if body.is_empty() {
                format!("dev:{method} {uri}")
            } else {
                format!("dev:{method} {uri} {body}")
            }
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Launcher that resolves to a fixed address, optionally after a gate opens.
pub struct TestLauncher {
    address: Result<String, String>,
    gate: Option<Arc<Notify>>,
    pub calls: Arc<AtomicUsize>,
}

impl TestLauncher {
    pub fn ready(addr: SocketAddr) -> Self {
        Self {
            address: Ok(format!("http://{addr}")),
            gate: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn gated(addr: SocketAddr, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::ready(addr)
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            address: Err(message.to_string()),
            gate: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DevServerLauncher for TestLauncher {
    fn start(
        &self,
        _request: LaunchRequest,
    ) -> BoxFuture<'static, Result<ServerHandle, LaunchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let address = self.address.clone();
        let gate = self.gate.clone();
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            address.map(ServerHandle::new).map_err(LaunchError::Other)
        }
        .boxed()
    }
}

/// Host pipeline with the middleware in front of a `local:<uri>` fallback.
pub fn host_app(router: Arc<EsmRouter>) -> Router {
    Router::new()
        .fallback(|uri: Uri| async move { format!("local:{uri}") })
        .layer(middleware::from_fn_with_state(router, esm_middleware))
}

/// Send a request through the app and collect status and body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}
