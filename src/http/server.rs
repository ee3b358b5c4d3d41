//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create Axum Router from the registered webhook routes
//! - Wire up middleware (request ID, tracing, timeout)
//! - Run the accept loop on plain TCP or TLS
//! - Govern the lifecycle: parent cancellation, listener errors, OS signals
//! - Bounded graceful shutdown
//!
//! # Data Flow
//! ```text
//! listen_and_serve(parent)
//!     → SignalForwarder (OS signals → signal channel)
//!     → accept task (axum-server; fatal errors → error channel)
//!     → governing loop: select { parent done, error, signal }
//!         reconfigure → hook, loop again
//!         anything else → drain or close, then Stopped
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Router};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;

use crate::config::{parse_bind_address, ServerConfig};
use crate::http::dispatch::{dispatch, not_found, RouteState};
use crate::lifecycle::{
    LifecycleSignal, ServerState, Shutdown, ShutdownError, ShutdownSignal, SignalAction,
    SignalForwarder,
};
use crate::net::load_tls_config;
use crate::routing::RouteTable;
use crate::webhook::Handler;

/// Capacity of the signal channel; signals beyond it are dropped, not queued.
const SIGNAL_CHANNEL_CAPACITY: usize = 8;

/// How often a draining shutdown checks for remaining connections.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errors that end `listen_and_serve`.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind, or the accept loop failed.
    #[error("listener failed: {0}")]
    Listener(#[source] std::io::Error),

    /// OS signal handlers could not be installed.
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

/// Lifecycle state shared between the server and its handles.
struct Shared {
    state: watch::Sender<ServerState>,
    /// Cancels request contexts once the server starts shutting down.
    requests: Shutdown,
    /// Set once a graceful drain has been requested.
    draining: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        let (state, _) = watch::channel(ServerState::Initialized);
        Self {
            state,
            requests: Shutdown::new(),
            draining: AtomicBool::new(false),
        }
    }

    fn transition(&self, next: ServerState) {
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                tracing::debug!(from = %current, to = %next, "State transition");
                *current = next;
                true
            } else {
                false
            }
        });
    }

    /// Enter `ShuttingDown` (from `Listening`) and cancel in-flight requests.
    fn begin_shutdown(&self) {
        self.transition(ServerState::ShuttingDown);
        self.requests.trigger();
    }
}

/// Webhook server: route table, listener and lifecycle.
pub struct WebhookServer {
    config: ServerConfig,
    routes: RouteTable,
    signals: Vec<LifecycleSignal>,
    span: Span,
    shared: Arc<Shared>,
    handle: axum_server::Handle,
    signal_tx: mpsc::Sender<LifecycleSignal>,
    signal_rx: mpsc::Receiver<LifecycleSignal>,
}

impl WebhookServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            config,
            routes: RouteTable::new(),
            signals: LifecycleSignal::DEFAULT.to_vec(),
            span: Span::current(),
            shared: Arc::new(Shared::new()),
            handle: axum_server::Handle::new(),
            signal_tx,
            signal_rx,
        }
    }

    /// Replace the OS signals that stop the server. An empty set keeps the defaults.
    pub fn with_signals(mut self, signals: &[LifecycleSignal]) -> Self {
        if !signals.is_empty() {
            self.signals = signals.to_vec();
        }
        self
    }

    /// Span that lifecycle events and request spans are recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Register a handler for a URL pattern.
    ///
    /// A pattern ending in `/` also serves every path below it.
    ///
    /// # Panics
    ///
    /// If the pattern is malformed or overlaps a registered one
    /// (see [`RouteTable::register`]).
    pub fn register_handler(&mut self, pattern: impl Into<String>, handler: impl Handler) {
        self.routes.register(pattern, Arc::new(handler));
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Control handle; stays usable after the server is consumed by `listen_and_serve`.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            inner: self.handle.clone(),
            shared: Arc::clone(&self.shared),
            state: self.shared.state.subscribe(),
            signals: self.signal_tx.clone(),
            shutdown_timeout: self.config.shutdown.timeout(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let mut router = Router::new();
        for route in self.routes.iter() {
            let state = RouteState {
                pattern: Arc::from(route.pattern()),
                handler: route.handler(),
                shutdown: self.shared.requests.subscribe(),
                span: self.span.clone(),
                max_body_bytes: self.config.limits.max_body_bytes,
            };
            for path in route.paths() {
                router = router.route(&path, any(dispatch).with_state(state.clone()));
            }
        }

        router.fallback(not_found).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    self.config.timeouts.request_secs,
                ))),
        )
    }

    /// Serve over TLS when the config names certificate files, plain TCP otherwise.
    pub async fn serve(self, parent: ShutdownSignal) -> Result<(), ServerError> {
        match self.config.listener.tls.clone() {
            Some(tls) => {
                self.listen_and_serve_tls(parent, &tls.cert_path, &tls.key_path)
                    .await
            }
            None => self.listen_and_serve(parent).await,
        }
    }

    /// Serve plain HTTP until the parent is cancelled, the listener fails,
    /// or a stop signal arrives.
    pub async fn listen_and_serve(self, parent: ShutdownSignal) -> Result<(), ServerError> {
        self.run(parent, None).await
    }

    /// Serve HTTPS with the given PEM certificate chain and private key.
    pub async fn listen_and_serve_tls(
        self,
        parent: ShutdownSignal,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<(), ServerError> {
        let paths = (
            cert_path.as_ref().to_path_buf(),
            key_path.as_ref().to_path_buf(),
        );
        self.run(parent, Some(paths)).await
    }

    async fn run(
        self,
        parent: ShutdownSignal,
        tls: Option<(PathBuf, PathBuf)>,
    ) -> Result<(), ServerError> {
        let addr = match parse_bind_address(&self.config.listener.bind_address) {
            Some(addr) => addr,
            None => {
                let err = ServerError::Listener(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid bind address {:?}", self.config.listener.bind_address),
                ));
                return self.fail_before_start(err);
            }
        };

        let tls_config = match &tls {
            Some((cert, key)) => match load_tls_config(cert, key).await {
                Ok(config) => Some(config),
                Err(e) => return self.fail_before_start(ServerError::Listener(e)),
            },
            None => None,
        };

        let listener = match bind_listener(addr) {
            Ok(listener) => listener,
            Err(e) => return self.fail_before_start(ServerError::Listener(e)),
        };
        let bound = listener.local_addr().unwrap_or(addr);

        let accept = accept_loop(listener, tls_config, self.router(), self.handle.clone());
        tracing::info!(
            parent: &self.span,
            address = %bound,
            tls = tls.is_some(),
            "Webhook server listening"
        );
        self.govern(parent, accept).await
    }

    /// The governing loop. `accept` is the blocking accept loop; an error it
    /// returns is fatal to the server.
    async fn govern<F>(mut self, parent: ShutdownSignal, accept: F) -> Result<(), ServerError>
    where
        F: Future<Output = std::io::Result<()>> + Send + 'static,
    {
        let forwarder = match SignalForwarder::spawn(&self.signals, self.signal_tx.clone()) {
            Ok(forwarder) => forwarder,
            Err(e) => return self.fail_before_start(ServerError::Signals(e)),
        };

        let (err_tx, mut err_rx) = mpsc::channel::<std::io::Error>(1);
        self.shared.transition(ServerState::Listening);
        let mut accept = tokio::spawn(async move {
            if let Err(e) = accept.await {
                let _ = err_tx.send(e).await;
            }
        });

        let shutdown = self.handle();
        let outcome = loop {
            tokio::select! {
                _ = parent.cancelled() => {
                    tracing::info!(parent: &self.span, "Parent context done, closing listener");
                    self.shared.begin_shutdown();
                    self.handle.shutdown();
                    break Ok(());
                }
                err = err_rx.recv() => {
                    match err {
                        Some(e) => {
                            tracing::error!(parent: &self.span, error = %e, "Listener failed");
                            self.shared.begin_shutdown();
                            break Err(ServerError::Listener(e));
                        }
                        None => {
                            tracing::info!(parent: &self.span, "Listener closed");
                            self.shared.begin_shutdown();
                            break Ok(());
                        }
                    }
                }
                Some(signal) = self.signal_rx.recv() => {
                    tracing::info!(parent: &self.span, signal = %signal, "Signal received");
                    match signal.action() {
                        SignalAction::Reconfigure => self.reconfigure(),
                        SignalAction::Shutdown => {
                            match shutdown.shutdown(&parent).await {
                                Ok(()) => tracing::info!(parent: &self.span, "Graceful shutdown complete"),
                                Err(e) => tracing::warn!(parent: &self.span, error = %e, "Graceful shutdown incomplete"),
                            }
                            break Ok(());
                        }
                    }
                }
            }
        };

        forwarder.stop().await;
        let grace = self.config.shutdown.timeout() + DRAIN_POLL_INTERVAL * 4;
        if tokio::time::timeout(grace, &mut accept).await.is_err() {
            tracing::warn!(parent: &self.span, "Accept loop did not exit, aborting");
            self.handle.shutdown();
            accept.abort();
        }
        err_rx.close();
        self.signal_rx.close();

        self.shared.transition(ServerState::Stopped);
        tracing::info!(parent: &self.span, "Webhook server stopped");
        outcome
    }

    /// Hook for SIGHUP. Keeps serving with the current configuration.
    fn reconfigure(&self) {
        tracing::info!(parent: &self.span, "Reconfigure requested, keeping current configuration");
    }

    fn fail_before_start(self, err: ServerError) -> Result<(), ServerError> {
        tracing::error!(parent: &self.span, error = %err, "Webhook server failed to start");
        self.shared.requests.trigger();
        self.shared.transition(ServerState::Stopped);
        Err(err)
    }
}

fn bind_listener(addr: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let listener = std::net::TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// The blocking accept loop over plain TCP or TLS.
async fn accept_loop(
    listener: std::net::TcpListener,
    tls: Option<RustlsConfig>,
    app: Router,
    handle: axum_server::Handle,
) -> std::io::Result<()> {
    match tls {
        Some(config) => {
            axum_server::from_tcp_rustls(listener, config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            axum_server::from_tcp(listener)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    }
}

/// Control handle for a running `WebhookServer`.
#[derive(Clone)]
pub struct ServerHandle {
    inner: axum_server::Handle,
    shared: Arc<Shared>,
    state: watch::Receiver<ServerState>,
    signals: mpsc::Sender<LifecycleSignal>,
    shutdown_timeout: Duration,
}

impl ServerHandle {
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// True once a graceful drain was requested through [`ServerHandle::shutdown`]
    /// or a stop signal. Parent cancellation and listener failures never drain.
    pub fn is_draining(&self) -> bool {
        self.shared.draining.load(Ordering::Acquire)
    }

    /// Resolves once the server reaches `Stopped`.
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| s.is_terminal()).await;
    }

    /// Bound address once accepting, or `None` if the server stopped without binding.
    pub async fn listening(&self) -> Option<SocketAddr> {
        tokio::select! {
            biased;
            addr = self.inner.listening() => addr,
            _ = self.stopped() => None,
        }
    }

    /// Deliver a lifecycle signal as if it came from the OS.
    ///
    /// Returns false if the server is gone or the signal channel is full.
    pub fn raise(&self, signal: LifecycleSignal) -> bool {
        self.signals.try_send(signal).is_ok()
    }

    /// Stop accepting and wait for in-flight requests, bounded by the
    /// configured shutdown timeout.
    ///
    /// Moves a listening server to `ShuttingDown` and cancels request
    /// contexts first. Connections still open at the deadline are closed.
    pub async fn shutdown(&self, parent: &ShutdownSignal) -> Result<(), ShutdownError> {
        self.shared.begin_shutdown();
        self.shared.draining.store(true, Ordering::Release);
        self.inner.graceful_shutdown(Some(self.shutdown_timeout));

        let drained = async {
            while self.inner.connection_count() > 0 {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        };

        tokio::select! {
            res = tokio::time::timeout(self.shutdown_timeout, drained) => {
                res.map_err(|_| ShutdownError::Timeout(self.shutdown_timeout))
            }
            _ = parent.cancelled() => Err(ShutdownError::Cancelled),
        }
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("state", &self.state())
            .field("connections", &self.inner.connection_count())
            .finish()
    }
}
