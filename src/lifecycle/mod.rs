//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! State (state.rs):
//!     Initialized → Listening → (ShuttingDown) → Stopped
//!
//! Shutdown (shutdown.rs):
//!     Parent context: Shutdown::trigger → every ShutdownSignal resolves
//!     Graceful window: stop accepting → drain in-flight → force close at deadline
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//!     SIGHUP → reconfigure hook, server keeps running
//! ```
//!
//! # Design Decisions
//! - The parent context is the only server-wide cancellation source
//! - Shutdown has a deadline: in-flight requests are cut off after it
//! - Signal and error channels are drained and closed by the governing loop

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::{Shutdown, ShutdownError, ShutdownSignal};
pub use signals::{LifecycleSignal, SignalAction, SignalForwarder};
pub use state::ServerState;
