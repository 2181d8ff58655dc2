//! Host event emitter.

use tokio::sync::broadcast;

/// Events published by the host over the lifetime of a test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    RunStart,
    RunComplete,
    /// A watched file changed on disk.
    FileChanged(String),
    /// Files served by the dev server changed; the host should reload them.
    RefreshFiles,
    /// The host is shutting down.
    Exit,
}

/// Broadcast channel shared by the host and its plugins.
///
/// Every clone publishes into the same channel. Subscribers only see events
/// emitted after they subscribed.
#[derive(Debug, Clone)]
pub struct Emitter {
    tx: broadcast::Sender<HostEvent>,
}

impl Emitter {
    /// Create a new emitter.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Subscribe to host events.
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Returns the number of subscribers that received it.
    pub fn emit(&self, event: HostEvent) -> usize {
        tracing::trace!(?event, "Host event");
        self.tx.send(event).unwrap_or(0)
    }

    /// Get the number of active subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `Exit` is emitted or the channel closes.
pub async fn wait_for_exit(rx: &mut broadcast::Receiver<HostEvent>) {
    loop {
        match rx.recv().await {
            Ok(HostEvent::Exit) | Err(broadcast::error::RecvError::Closed) => return,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
        }
    }
}
