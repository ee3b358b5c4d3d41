//! Conversational-agent webhook library.
//!
//! Handlers receive a parsed [`WebhookRequest`] and fill in a
//! [`WebhookResponse`]; [`WebhookServer`] routes HTTP POSTs to them and owns
//! the listener lifecycle.
//!
//! ```no_run
//! use cx_webhook::{
//!     config::ServerConfig, HandlerResult, Shutdown, WebhookRequest, WebhookResponse,
//!     WebhookServer,
//! };
//!
//! fn hello(res: &mut WebhookResponse, req: &WebhookRequest) -> HandlerResult {
//!     let color = req.session_parameter("color").map(|c| c.to_string());
//!     res.add_text_message([format!("You picked {}", color.unwrap_or_default())]);
//!     Ok(())
//! }
//!
//! # async fn run() -> Result<(), cx_webhook::ServerError> {
//! let mut server = WebhookServer::new(ServerConfig::default());
//! server.register_handler("/hello", hello);
//! let parent = Shutdown::new();
//! server.listen_and_serve(parent.subscribe()).await
//! # }
//! ```

// Protocol model
pub mod codec;
pub mod webhook;

// Serving
pub mod config;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use codec::{CodecError, DynamicValue, Parameters};
pub use config::ServerConfig;
pub use http::{ServerError, ServerHandle, WebhookServer};
pub use lifecycle::{LifecycleSignal, ServerState, Shutdown, ShutdownSignal};
pub use webhook::{
    BoxError, FulfillmentMessage, Handler, HandlerResult, RequestContext, WebhookRequest,
    WebhookResponse,
};
