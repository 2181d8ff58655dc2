//! OS signal handling.
//!
//! Ctrl+C is translated into `HostEvent::Exit` so that plugins holding child
//! processes can clean up before the host stops.

use crate::lifecycle::emitter::{wait_for_exit, Emitter, HostEvent};

/// Emit `Exit` on Ctrl+C, then resolve once the exit event is observed.
///
/// Suitable as the graceful-shutdown future of the host server.
pub async fn shutdown_signal(emitter: Emitter) {
    let mut rx = emitter.subscribe();
    tokio::select! {
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                emitter.emit(HostEvent::Exit);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                let mut fallback = emitter.subscribe();
                wait_for_exit(&mut fallback).await;
            }
        },
        _ = wait_for_exit(&mut rx) => {}
    }
}
