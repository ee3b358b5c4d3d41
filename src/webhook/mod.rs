//! Webhook protocol adapter.
//!
//! # Data Flow
//! ```text
//! HTTP body bytes
//!     → request.rs (parse wire JSON, unknown fields dropped)
//!     → context.rs (request-scoped context attached once by the server)
//!     → response.rs (reply seeded from the request: session id, page, payload)
//!     → handler.rs (user logic mutates the reply, reads the request)
//!     → response.rs (encode reply to wire JSON)
//! ```
//!
//! # Design Decisions
//! - Wire structs (wire.rs) stay private to the adapter types; handlers only
//!   see accessors and `DynamicValue` maps
//! - Absent sections read as empty maps, never as errors
//! - One request/response pair per handler invocation, never shared

pub mod context;
pub mod handler;
pub mod request;
pub mod response;
pub mod testing;
pub(crate) mod wire;

use thiserror::Error;

use crate::codec::CodecError;

pub use context::RequestContext;
pub use handler::{BoxError, Handler, HandlerResult};
pub use request::{FormParameter, WebhookRequest};
pub use response::{FulfillmentMessage, WebhookResponse};
pub use wire::FillState;

/// Inbound bytes could not be turned into a [`WebhookRequest`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed webhook request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read webhook request: {0}")]
    Io(#[from] std::io::Error),
}

/// A built message could not be written as wire JSON.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to encode webhook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write webhook JSON: {0}")]
    Io(#[from] std::io::Error),
}
