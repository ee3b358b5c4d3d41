//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → axum-server accept loop (owned by http::server)
//!     → tls.rs (optional TLS handshake, certificates loaded once at start)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled transparently
//! - Certificate problems surface as listener errors before any accept

pub mod tls;

pub use tls::load_tls_config;
