//! Dev server run as a child process.
//!
//! # Responsibilities
//! - Reserve a free port and spawn the configured command
//! - Translate settings into command-line flags
//! - Wait until the port accepts connections
//! - Tie the child's lifetime to host events
//!
//! # Design Decisions
//! - No startup deadline; the wait ends when the port opens or the child exits
//! - Readiness checks back off exponentially
//! - Host events are subscribed when `start` is called, before the child boots
//! - The child is killed on `Exit` and when the supervisor is dropped

use std::process::Stdio;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::task::JoinHandle;
use url::Url;

use crate::config::DevServerConfig;
use crate::dev_server::launcher::{
    DevServerLauncher, LaunchError, LaunchRequest, ServerHandle,
};
use crate::lifecycle::emitter::wait_for_exit;
use crate::lifecycle::{Emitter, HostEvent};
use crate::resilience::backoff::ReadinessBackoff;
use crate::transform::DevServerSettings;

/// Environment variable carrying the transform settings as JSON.
pub const TRANSFORM_ENV: &str = "ESM_PROXY_BABEL_CONFIG";

/// Launches the dev server command from `[dev_server]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl DevServerLauncher for ProcessLauncher {
    fn start(
        &self,
        request: LaunchRequest,
    ) -> BoxFuture<'static, Result<ServerHandle, LaunchError>> {
        // subscribe now so an Exit emitted while booting is seen
        let events = request.emitter.subscribe();
        launch(request, events).boxed()
    }
}

async fn launch(
    request: LaunchRequest,
    mut events: Receiver<HostEvent>,
) -> Result<ServerHandle, LaunchError> {
    let LaunchRequest {
        config,
        settings,
        watch,
        transform,
        emitter,
    } = request;
    let dev_server = &config.dev_server;
    // only a watching supervisor publishes events
    let refresh = watch.then_some(emitter);

    let port = reserve_port(&settings.hostname)?;
    let args = command_args(dev_server, &settings, watch, port);

    tracing::info!(
        command = %dev_server.command,
        port,
        watch,
        transforms = transform.enabled,
        "Starting dev server"
    );

    let mut child = Command::new(&dev_server.command)
        .args(&args)
        .env(TRANSFORM_ENV, transform.to_json()?)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            command: dev_server.command.clone(),
            source,
        })?;

    wait_until_listening(&mut child, &mut events, &settings.hostname, port, dev_server).await?;

    let url = Url::parse(&format!("http://{}:{}", settings.hostname, port))?;
    supervise(child, events, refresh);

    Ok(ServerHandle::from_url(&url))
}

/// Ask the OS for a free port on `hostname`.
fn reserve_port(hostname: &str) -> Result<u16, LaunchError> {
    let listener = std::net::TcpListener::bind((hostname, 0)).map_err(LaunchError::Port)?;
    let port = listener.local_addr().map_err(LaunchError::Port)?.port();
    Ok(port)
}

/// Flags passed after the configured arguments.
pub fn command_args(
    config: &DevServerConfig,
    settings: &DevServerSettings,
    watch: bool,
    port: u16,
) -> Vec<String> {
    let mut args = config.args.clone();
    args.extend([
        "--port".to_string(),
        port.to_string(),
        "--hostname".to_string(),
        settings.hostname.clone(),
        "--root-dir".to_string(),
        settings.root_dir.clone(),
        "--compatibility".to_string(),
        settings.compatibility.clone(),
    ]);

    if settings.node_resolve {
        args.push("--node-resolve".to_string());
    }
    if settings.preserve_symlinks {
        args.push("--preserve-symlinks".to_string());
    }
    if !settings.module_dirs.is_empty() {
        args.push("--module-dirs".to_string());
        args.push(settings.module_dirs.join(","));
    }
    if !settings.file_extensions.is_empty() {
        args.push("--file-extensions".to_string());
        args.push(settings.file_extensions.join(","));
    }
    if settings.polyfills {
        args.push("--polyfills".to_string());
    }
    if settings.babel {
        args.push("--babel".to_string());
    }
    if watch {
        args.push("--watch".to_string());
    }

    args
}

async fn wait_until_listening(
    child: &mut Child,
    events: &mut Receiver<HostEvent>,
    hostname: &str,
    port: u16,
    config: &DevServerConfig,
) -> Result<(), LaunchError> {
    let mut backoff = ReadinessBackoff::new(config);
    loop {
        if TcpStream::connect((hostname, port)).await.is_ok() {
            tracing::debug!(
                port,
                attempts = backoff.attempts() + 1,
                "Dev server accepting connections"
            );
            return Ok(());
        }

        if let Some(status) = child.try_wait().map_err(LaunchError::Wait)? {
            return Err(LaunchError::Exited(status));
        }

        let delay = backoff.next_delay();
        tracing::trace!(port, attempt = backoff.attempts(), ?delay, "Dev server not ready yet");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wait_for_exit(events) => {
                tracing::info!(port, "Host exiting, stopping dev server before it was ready");
                stop(child).await;
                return Err(LaunchError::Stopped);
            }
        }
    }
}

async fn stop(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "Failed to stop dev server");
    }
}

/// Kill the child on `Exit`. With `refresh`, file changes become reloads.
///
/// The channel only closes once the host dropped every emitter, which
/// cannot happen while `refresh` holds one.
fn supervise(
    mut child: Child,
    mut events: Receiver<HostEvent>,
    refresh: Option<Emitter>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                status = child.wait() => {
                    match status {
                        Ok(status) => tracing::warn!(%status, "Dev server exited"),
                        Err(e) => tracing::warn!(error = %e, "Lost track of dev server process"),
                    }
                    return;
                }
                event = events.recv() => match event {
                    Ok(HostEvent::Exit) | Err(RecvError::Closed) => {
                        tracing::info!("Stopping dev server");
                        stop(&mut child).await;
                        return;
                    }
                    Ok(HostEvent::FileChanged(path)) => {
                        if let Some(emitter) = &refresh {
                            tracing::debug!(%path, "File changed, refreshing");
                            emitter.emit(HostEvent::RefreshFiles);
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Missed host events");
                    }
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::transform::create_esm_config;
    use std::time::Duration;

    #[test]
    fn test_command_args() {
        let mut config = HostConfig::default();
        config.base_path = "web".into();
        config.esm.compatibility = "auto".into();
        config.esm.file_extensions = vec![".ts".into(), ".mjs".into()];
        config.esm.coverage = true;
        let (settings, _) = create_esm_config(&config).unwrap();

        let args = command_args(&config.dev_server, &settings, true, 9100);
        assert_eq!(
            args,
            vec![
                "es-dev-server", "--port", "9100", "--hostname", "localhost",
                "--root-dir", "web", "--compatibility", "auto", "--node-resolve",
                "--module-dirs", "node_modules", "--file-extensions", ".ts,.mjs",
                "--babel", "--watch",
            ]
        );
    }

    #[test]
    fn test_command_args_minimal() {
        let mut config = HostConfig::default();
        config.esm.node_resolve = false;
        config.esm.module_dirs.clear();
        let (settings, _) = create_esm_config(&config).unwrap();

        let args = command_args(&config.dev_server, &settings, false, 1);
        assert!(!args.contains(&"--watch".to_string()));
        assert!(!args.contains(&"--babel".to_string()));
        assert!(!args.contains(&"--node-resolve".to_string()));
        assert!(!args.contains(&"--module-dirs".to_string()));
    }

    fn request_for(command: &str) -> LaunchRequest {
        let mut config = HostConfig::default();
        config.dev_server.command = command.into();
        config.dev_server.args.clear();
        config.dev_server.hostname = "127.0.0.1".into();
        let (settings, transform) = create_esm_config(&config).unwrap();
        LaunchRequest {
            config,
            settings,
            watch: false,
            transform,
            emitter: Emitter::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_command() {
        let err = ProcessLauncher
            .start(request_for("esm-proxy-no-such-binary"))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[cfg(unix)]
    fn slow_boot_request() -> LaunchRequest {
        let mut request = request_for("sh");
        // extra flags land in $0.. and are ignored
        request.config.dev_server.args = vec!["-c".into(), "sleep 5".into()];
        request
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_before_first_poll_stops_boot() {
        let request = slow_boot_request();
        let emitter = request.emitter.clone();

        let startup = ProcessLauncher.start(request);
        emitter.emit(HostEvent::Exit);

        let err = tokio::time::timeout(Duration::from_secs(2), startup)
            .await
            .expect("boot abandoned on exit")
            .unwrap_err();
        assert!(matches!(err, LaunchError::Stopped));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_while_booting_stops_child() {
        let request = slow_boot_request();
        let emitter = request.emitter.clone();

        let startup = tokio::spawn(ProcessLauncher.start(request));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!startup.is_finished());
        emitter.emit(HostEvent::Exit);

        let err = tokio::time::timeout(Duration::from_secs(2), startup)
            .await
            .expect("boot abandoned on exit")
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, LaunchError::Stopped));
    }

    #[cfg(unix)]
    fn sleeping_child() -> Child {
        Command::new("sleep")
            .arg("5")
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_supervisor_stops_child_on_exit() {
        let emitter = Emitter::new();
        let task = supervise(sleeping_child(), emitter.subscribe(), None);

        emitter.emit(HostEvent::Exit);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("supervisor finished")
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_supervisor_stops_child_when_host_drops_emitter() {
        let emitter = Emitter::new();
        let task = supervise(sleeping_child(), emitter.subscribe(), None);

        drop(emitter);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("supervisor finished")
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_watching_supervisor_refreshes_on_change() {
        let emitter = Emitter::new();
        let mut observer = emitter.subscribe();
        let task = supervise(sleeping_child(), emitter.subscribe(), Some(emitter.clone()));

        emitter.emit(HostEvent::FileChanged("src/app.js".into()));
        let refreshed = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if observer.recv().await.unwrap() == HostEvent::RefreshFiles {
                    return;
                }
            }
        })
        .await;
        assert!(refreshed.is_ok());

        emitter.emit(HostEvent::Exit);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_exits_before_listening() {
        let err = ProcessLauncher.start(request_for("false")).await.unwrap_err();
        assert!(matches!(err, LaunchError::Exited(status) if !status.success()));
    }
}
