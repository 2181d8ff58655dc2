//! Streaming proxy to the dev server.
//!
//! # Responsibilities
//! - Build the upstream URI (`<handle><target without leading /base>`)
//! - Stream the inbound body upstream and the response back
//! - Swallow transport errors
//!
//! # Design Decisions
//! - Bodies are never buffered
//! - Hop-by-hop headers are not forwarded
//! - A transport error is not logged; the client gets an empty 502

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::dev_server::ServerHandle;
use crate::http::middleware::RouteError;
use crate::routing::rules::strip_base;

/// HTTP client that relays requests to the dev server.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
}

impl Forwarder {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    /// Upstream URI for an inbound request URI.
    pub fn target_uri(handle: &ServerHandle, uri: &Uri) -> Result<Uri, RouteError> {
        let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let proxied = format!("{}{}", handle, strip_base(target));
        proxied
            .parse()
            .map_err(|source| RouteError::InvalidTarget { target: proxied, source })
    }

    /// Relay the request. Only target construction can fail.
    pub async fn forward(
        &self,
        handle: &ServerHandle,
        request: Request<Body>,
    ) -> Result<Response, RouteError> {
        let (mut parts, body) = request.into_parts();
        parts.uri = Self::target_uri(handle, &parts.uri)?;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);

        tracing::trace!(target = %parts.uri, method = %parts.method, "Forwarding to dev server");

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => Ok(response.map(Body::new)),
            // connection resets and aborted navigations land here
            Err(_) => Ok(StatusCode::BAD_GATEWAY.into_response()),
        }
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in [
        header::CONNECTION,
        header::HOST,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ] {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers.remove("proxy-connection");
}
