//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Setup (single-threaded, before start):
//!     register_handler(pattern, handler)
//!     → router.rs (duplicate check, ordered table)
//!
//! Start:
//!     RouteTable
//!     → expand patterns (exact, or subtree for trailing '/')
//!     → freeze into the HTTP router
//! ```
//!
//! # Design Decisions
//! - Exactly one routing primitive: pattern → handler
//! - Immutable after start, so no locking on the request path

pub mod router;

pub use router::{Route, RouteTable};
