//! Server lifecycle states.

use std::fmt;

/// Where the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Built, routes may still be registered.
    Initialized,
    /// Accept loop running.
    Listening,
    /// Graceful shutdown in progress; no new connections.
    ShuttingDown,
    /// Accept loop finished. Terminal.
    Stopped,
}

impl ServerState {
    /// Allowed transitions. `ShuttingDown` is only entered from `Listening`.
    pub fn can_transition_to(self, next: ServerState) -> bool {
        use ServerState::*;
        matches!(
            (self, next),
            (Initialized, Listening)
                | (Initialized, Stopped)
                | (Listening, ShuttingDown)
                | (Listening, Stopped)
                | (ShuttingDown, Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ServerState::Stopped
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Initialized => "initialized",
            ServerState::Listening => "listening",
            ServerState::ShuttingDown => "shutting_down",
            ServerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
