//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (axum-server accept loop, middleware, lifecycle)
//!     → router (pattern → route state)
//!     → dispatch.rs (method check, parse, handler, serialize)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod server;

pub use dispatch::X_REQUEST_ID;
pub use server::{ServerError, ServerHandle, WebhookServer};
