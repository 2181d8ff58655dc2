//! One-shot dev server startup shared by every request.
//!
//! The startup task is spawned when the cell is created. Requests resolve
//! the cell; while the task runs they all await the same shared future,
//! afterwards they read the settled state without suspending.

use std::sync::{Arc, PoisonError, RwLock};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::config::ConfigError;
use crate::dev_server::launcher::{
    DevServerLauncher, LaunchError, LaunchRequest, ServerHandle,
};
use crate::observability::Diagnostics;

/// Context attached to asynchronous startup failures.
pub const STARTUP_FAILURE_CONTEXT: &str = "Error while setting up es-dev-server";

/// Error type for middleware setup.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("no async runtime to start the dev server on: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("dev server failed to start: {0}")]
    Launch(#[from] LaunchError),

    #[error("dev server startup task aborted: {0}")]
    Aborted(String),
}

type StartupResult = Result<ServerHandle, Arc<SetupError>>;
type StartupFuture = Shared<BoxFuture<'static, StartupResult>>;

enum ServerState {
    Pending(StartupFuture),
    Ready(ServerHandle),
    Failed(Arc<SetupError>),
}

/// Observable phase of the startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Ready,
    Failed,
}

/// Holds the dev server address, pending until startup settles.
pub struct DevServerCell {
    state: RwLock<ServerState>,
}

impl DevServerCell {
    /// Spawn the startup task on the current runtime.
    pub fn start(
        launcher: Arc<dyn DevServerLauncher>,
        request: LaunchRequest,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, SetupError> {
        let runtime = tokio::runtime::Handle::try_current()?;

        // started outside the task so the launcher sees host events from now on
        let startup = launcher.start(request);
        let task = runtime.spawn(async move {
            match startup.await {
                Ok(handle) => {
                    tracing::info!(address = %handle, "Dev server ready");
                    Ok(handle)
                }
                Err(e) => {
                    let err = SetupError::from(e);
                    diagnostics.error(STARTUP_FAILURE_CONTEXT, &err);
                    Err(Arc::new(err))
                }
            }
        });

        let pending = async move {
            match task.await {
                Ok(result) => result,
                Err(join) => Err(Arc::new(SetupError::Aborted(join.to_string()))),
            }
        }
        .boxed()
        .shared();

        Ok(Self::from_state(ServerState::Pending(pending)))
    }

    /// A cell that is already resolved.
    pub fn ready(handle: ServerHandle) -> Self {
        Self::from_state(ServerState::Ready(handle))
    }

    fn from_state(state: ServerState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn phase(&self) -> Phase {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            ServerState::Pending(_) => Phase::Starting,
            ServerState::Ready(_) => Phase::Ready,
            ServerState::Failed(_) => Phase::Failed,
        }
    }

    /// Wait for startup to settle and return its outcome.
    pub async fn resolve(&self) -> StartupResult {
        let pending = match self.settled() {
            Ok(result) => return result,
            Err(pending) => pending,
        };

        let result = pending.await;
        self.settle(&result);
        result
    }

    fn settled(&self) -> Result<StartupResult, StartupFuture> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            ServerState::Ready(handle) => Ok(Ok(handle.clone())),
            ServerState::Failed(err) => Ok(Err(err.clone())),
            ServerState::Pending(pending) => Err(pending.clone()),
        }
    }

    fn settle(&self, result: &StartupResult) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, ServerState::Pending(_)) {
            *state = match result {
                Ok(handle) => ServerState::Ready(handle.clone()),
                Err(err) => ServerState::Failed(err.clone()),
            };
        }
    }
}

impl std::fmt::Debug for DevServerCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevServerCell")
            .field("phase", &self.phase())
            .finish()
    }
}
