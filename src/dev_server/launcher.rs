//! Dev server startup contract.

use std::fmt;

use futures_util::future::BoxFuture;
use url::Url;

use crate::config::HostConfig;
use crate::lifecycle::Emitter;
use crate::transform::{DevServerSettings, TransformSettings};

/// Base address of a running dev server, e.g. `http://localhost:9000`.
///
/// Request targets are appended verbatim, so the address carries no
/// trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerHandle(String);

impl ServerHandle {
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self(address.trim_end_matches('/').to_string())
    }

    /// Origin of a URL (scheme, host and port).
    pub fn from_url(url: &Url) -> Self {
        Self::new(url.origin().ascii_serialization())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the launcher gets from the middleware factory.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Host run configuration.
    pub config: HostConfig,
    pub settings: DevServerSettings,
    pub watch: bool,
    pub transform: TransformSettings,
    pub emitter: Emitter,
}

/// Error type for dev server startup.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to reserve a port: {0}")]
    Port(#[source] std::io::Error),

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to poll dev server process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("dev server exited before accepting connections ({0})")]
    Exited(std::process::ExitStatus),

    #[error("failed to encode transform settings: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid dev server address: {0}")]
    Address(#[from] url::ParseError),

    #[error("host exited before the dev server was ready")]
    Stopped,

    #[error("{0}")]
    Other(String),
}

/// Starts the external dev server.
///
/// Called once per middleware. The returned future resolves with the base
/// address once the server accepts connections.
pub trait DevServerLauncher: Send + Sync {
    fn start(
        &self,
        request: LaunchRequest,
    ) -> BoxFuture<'static, Result<ServerHandle, LaunchError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_trims_trailing_slash() {
        let handle = ServerHandle::new("http://localhost:9000/");
        assert_eq!(handle.as_str(), "http://localhost:9000");
    }

    #[test]
    fn test_handle_from_url() {
        let url = Url::parse("http://127.0.0.1:9123").unwrap();
        let handle = ServerHandle::from_url(&url);
        assert_eq!(handle.to_string(), "http://127.0.0.1:9123");
    }
}
