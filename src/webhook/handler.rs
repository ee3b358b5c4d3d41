//! The handler contract: user logic invoked once per webhook call.

use async_trait::async_trait;

use crate::webhook::request::WebhookRequest;
use crate::webhook::response::WebhookResponse;

/// Error type returned by handlers. The server logs it and never inspects it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = Result<(), BoxError>;

/// Fulfillment logic for one route.
///
/// The response arrives pre-seeded from the request (see
/// [`WebhookResponse::from_request`]). Dependencies such as HTTP clients or
/// database pools belong in the implementing type, not in globals.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, res: &mut WebhookResponse, req: &WebhookRequest) -> HandlerResult;
}

/// Plain functions and closures are synchronous handlers.
#[async_trait]
impl<F> Handler for F
where
    F: Fn(&mut WebhookResponse, &WebhookRequest) -> HandlerResult + Send + Sync + 'static,
{
    async fn handle(&self, res: &mut WebhookResponse, req: &WebhookRequest) -> HandlerResult {
        self(res, req)
    }
}
