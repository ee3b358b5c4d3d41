//! Request-scoped context handed to handlers.

use tracing::Span;

use crate::lifecycle::ShutdownSignal;

/// Context bound to one webhook invocation.
///
/// Carries the request id, the span the request is logged under, and the
/// server's shutdown signal so long-running handlers can stop early.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    span: Span,
    shutdown: ShutdownSignal,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, span: Span, shutdown: ShutdownSignal) -> Self {
        Self {
            request_id: request_id.into(),
            span,
            shutdown,
        }
    }

    /// A context that is never cancelled, logging under the caller's span.
    pub fn background() -> Self {
        Self::new("background", Span::current(), ShutdownSignal::never())
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Span for handler logging; events recorded in it carry the request id.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// True once the server has started shutting down.
    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Resolves when the server starts shutting down.
    pub async fn cancelled(&self) {
        self.shutdown.cancelled().await
    }
}
