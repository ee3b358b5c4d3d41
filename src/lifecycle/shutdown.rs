//! Shutdown coordination for the webhook server.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

/// Errors from a bounded graceful shutdown.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// In-flight connections were still open when the window closed; they
    /// are closed forcibly.
    #[error("graceful shutdown timed out after {0:?}")]
    Timeout(Duration),

    /// The parent context was cancelled while waiting for connections to drain.
    #[error("graceful shutdown interrupted by parent cancellation")]
    Cancelled,
}

/// Coordinator for cancellation.
///
/// Provides a trigger-once watch channel that every long-running task can
/// subscribe to. Used as the parent context handed to the server and as
/// the server's own signal to in-flight handlers.
#[derive(Debug)]
pub struct Shutdown {
    /// Watch channel sender; flips to `true` exactly once.
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal. Later calls are no-ops.
    pub fn trigger(&self) {
        self.tx.send_if_modified(|triggered| !std::mem::replace(triggered, true));
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Get the number of active subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`Shutdown`].
///
/// If the coordinator is dropped without triggering, the signal never fires.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the coordinator triggers.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
