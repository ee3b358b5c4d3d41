//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP, SIGQUIT)
//! - Translate signals to lifecycle events on a channel
//! - Map each event to an action (shutdown, reconfigure)
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers the reconfigure hook, not shutdown
//! - Only Ctrl+C is available off Unix; other signals are ignored there

use std::collections::HashSet;
use std::fmt;
use std::io;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Signals the server reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleSignal {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
}

/// What the governing loop does with a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Shutdown,
    Reconfigure,
}

impl LifecycleSignal {
    /// Signals watched when the caller names none.
    pub const DEFAULT: [LifecycleSignal; 3] = [
        LifecycleSignal::Interrupt,
        LifecycleSignal::Terminate,
        LifecycleSignal::Hangup,
    ];

    pub fn action(self) -> SignalAction {
        match self {
            LifecycleSignal::Hangup => SignalAction::Reconfigure,
            LifecycleSignal::Interrupt | LifecycleSignal::Terminate | LifecycleSignal::Quit => {
                SignalAction::Shutdown
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LifecycleSignal::Interrupt => "SIGINT",
            LifecycleSignal::Terminate => "SIGTERM",
            LifecycleSignal::Hangup => "SIGHUP",
            LifecycleSignal::Quit => "SIGQUIT",
        }
    }

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            LifecycleSignal::Interrupt => SignalKind::interrupt(),
            LifecycleSignal::Terminate => SignalKind::terminate(),
            LifecycleSignal::Hangup => SignalKind::hangup(),
            LifecycleSignal::Quit => SignalKind::quit(),
        }
    }
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Background tasks copying OS signals onto a channel.
///
/// One task per watched signal; each is the only producer for its signal.
pub struct SignalForwarder {
    tasks: JoinSet<()>,
}

impl SignalForwarder {
    /// Install handlers for `signals` and start forwarding into `tx`.
    pub fn spawn(signals: &[LifecycleSignal], tx: mpsc::Sender<LifecycleSignal>) -> io::Result<Self> {
        let mut tasks = JoinSet::new();
        let mut seen = HashSet::new();

        for &signal in signals {
            if !seen.insert(signal) {
                continue;
            }

            #[cfg(unix)]
            {
                let mut stream = tokio::signal::unix::signal(signal.kind())?;
                let tx = tx.clone();
                tasks.spawn(async move {
                    while stream.recv().await.is_some() {
                        if tx.send(signal).await.is_err() {
                            break;
                        }
                    }
                });
            }

            #[cfg(not(unix))]
            {
                if signal == LifecycleSignal::Interrupt {
                    let tx = tx.clone();
                    tasks.spawn(async move {
                        while tokio::signal::ctrl_c().await.is_ok() {
                            if tx.send(signal).await.is_err() {
                                break;
                            }
                        }
                    });
                } else {
                    tracing::warn!(signal = %signal, "Signal not supported on this platform, ignoring");
                }
            }
        }

        tracing::debug!(count = tasks.len(), "Signal handlers installed");
        Ok(Self { tasks })
    }

    /// Stop every forwarding task and wait until none can send again.
    pub async fn stop(mut self) {
        self.tasks.shutdown().await;
    }
}
