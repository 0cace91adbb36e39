//! HTTP server implementation.
//!
//! [`RestServer`] is a two-state machine: **stopped** (initial, and after
//! [`shutdown`](RestServer::shutdown)) and **running**.
//!
//! - [`start`](RestServer::start) spawns the listener on the current Tokio
//!   runtime and returns immediately. If the listener later dies on its own
//!   (bind failure, persistent accept failure) the caller's crash channel
//!   fires once.
//! - [`shutdown`](RestServer::shutdown) stops accepting, lets in-flight
//!   connections finish for up to [`SHUTDOWN_TIMEOUT`], then aborts whatever
//!   is left.
//!
//! Every request passes through the CORS stage before the route table.
//!
//! # Example
//!
//! ```rust,no_run
//! use logcollector_server::{RestServer, ServerConfig};
//!
//! # async fn run() -> Result<(), logcollector_server::ServerError> {
//! let config = ServerConfig::builder().http_addr("127.0.0.1:8000").build();
//! let mut server = RestServer::new(config);
//!
//! let (crashed_tx, crashed_rx) = tokio::sync::oneshot::channel();
//! server.start(Some(crashed_tx))?;
//! # let _ = crashed_rx;
//!
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};

use logcollector_core::{BoxError, BufferedResponse, Handler, HttpResponse, Request};
use logcollector_middleware::stages::CorsMiddleware;
use logcollector_middleware::Pipeline;

use crate::config::ServerConfig;
use crate::route::Route;
use crate::router::Router;
use crate::shutdown::ShutdownSignal;

/// How long [`RestServer::shutdown`] waits for in-flight connections.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Consecutive non-connection accept failures tolerated before the
/// listener gives up.
const MAX_ACCEPT_FAILURES: u32 = 10;

const ACCEPT_BACKOFF_START: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Server error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// `start` was called while the server is running.
    #[error("server already started")]
    AlreadyStarted,

    /// `shutdown` was called while the server is stopped.
    #[error("server not started")]
    NotStarted,

    /// `start` was called outside a Tokio runtime.
    #[error("no Tokio runtime available to run the server")]
    NoRuntime,

    /// The configured address is not a socket address.
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// Failed to bind to the configured address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The listener stopped accepting connections.
    #[error("accept error: {0}")]
    Accept(String),
}

/// Where the background listener is in its startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Pending,
    Bound(SocketAddr),
    Failed,
}

/// State kept while the server is running.
struct Running {
    shutdown: ShutdownSignal,
    task: JoinHandle<()>,
    binding: watch::Receiver<Binding>,
}

/// The REST server.
///
/// Holds the configuration and the route table; the listener exists only
/// between [`start`](Self::start) and [`shutdown`](Self::shutdown).
pub struct RestServer {
    config: ServerConfig,
    router: Router,
    running: Option<Running>,
}

impl RestServer {
    /// Creates a stopped server with an empty route table.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Router::new(),
            running: None,
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the route table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns `true` between a successful `start` and `shutdown`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Registers routes, building each route's handler chain now.
    ///
    /// The running listener serves the table as it was at `start`; routes
    /// added later take effect on the next start.
    pub fn add_routes<I>(&mut self, routes: I)
    where
        I: IntoIterator<Item = Route>,
    {
        let request_logging = self.config.request_logging();
        for route in routes {
            self.router.add_route(route, request_logging);
        }
    }

    /// Builds the top-level handler: CORS in front of the route table.
    #[must_use]
    pub fn service(&self) -> Pipeline {
        let cors = CorsMiddleware::builder()
            .allow_headers(self.config.allowed_headers().iter().cloned())
            .allow_origins(self.config.allowed_origins().iter().cloned())
            .allow_methods(self.config.allowed_methods().iter().cloned())
            .build();

        Pipeline::builder().stage(cors).build(self.router.clone())
    }

    /// Starts serving in the background.
    ///
    /// Must be called from within a Tokio runtime. `crashed` receives a
    /// message if the listener terminates without being asked to.
    ///
    /// # Errors
    ///
    /// - [`ServerError::AlreadyStarted`] if the server is running
    /// - [`ServerError::NoRuntime`] outside a Tokio runtime
    /// - [`ServerError::InvalidAddress`] if the address does not parse
    pub fn start(&mut self, crashed: Option<oneshot::Sender<()>>) -> Result<(), ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyStarted);
        }
        let runtime = Handle::try_current().map_err(|_| ServerError::NoRuntime)?;
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            headers = ?self.config.allowed_headers(),
            origins = ?self.config.allowed_origins(),
            methods = ?self.config.allowed_methods(),
            "CORS allow lists"
        );

        let service = Arc::new(self.service());
        let shutdown = ShutdownSignal::new();
        let (binding_tx, binding_rx) = watch::channel(Binding::Pending);
        let listener = Listener {
            addr,
            keep_alive: self.config.keep_alive(),
            service,
            shutdown: shutdown.clone(),
            binding: binding_tx,
        };

        let task = runtime.spawn(async move {
            match listener.run().await {
                Ok(()) => tracing::info!("listener stopped"),
                Err(e) => {
                    tracing::error!(error = %e, "listener terminated unexpectedly");
                    if let Some(crashed) = crashed {
                        // The receiver may already be gone.
                        let _ = crashed.send(());
                    }
                }
            }
        });

        self.running = Some(Running {
            shutdown,
            task,
            binding: binding_rx,
        });
        Ok(())
    }

    /// Returns the bound address once the listener is up.
    ///
    /// Resolves to `None` if the server is stopped or binding failed.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        let mut binding = self.running.as_ref()?.binding.clone();
        let state = *binding
            .wait_for(|b| *b != Binding::Pending)
            .await
            .ok()?;
        match state {
            Binding::Bound(addr) => Some(addr),
            Binding::Pending | Binding::Failed => None,
        }
    }

    /// Stops the server.
    ///
    /// Waits up to [`SHUTDOWN_TIMEOUT`] for open connections to finish and
    /// then aborts them. The server is stopped afterwards either way.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotStarted`] if the server is not running.
    pub async fn shutdown(&mut self) -> Result<(), ServerError> {
        let Some(running) = self.running.take() else {
            return Err(ServerError::NotStarted);
        };

        running.shutdown.trigger();
        let mut task = running.task;
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task).await {
            Ok(Ok(())) => tracing::info!("server shut down gracefully"),
            Ok(Err(e)) => tracing::error!(error = %e, "server task failed"),
            Err(_) => {
                tracing::warn!(
                    timeout = ?SHUTDOWN_TIMEOUT,
                    "graceful shutdown timed out, closing remaining connections"
                );
                task.abort();
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RestServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestServer")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("running", &self.running.is_some())
            .finish()
    }
}

/// Serves one request through `handler` and returns the buffered response.
///
/// The request body is boxed as is, so body read errors reach the handler.
pub async fn dispatch<H, B>(handler: &H, request: http::Request<B>) -> HttpResponse
where
    H: Handler + ?Sized,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let mut request: Request = request.map(|body| body.map_err(Into::into).boxed_unsync());
    let mut w = BufferedResponse::new();
    handler.serve(&mut w, &mut request).await;
    w.into_response()
}

/// The background accept loop.
struct Listener {
    addr: SocketAddr,
    keep_alive: bool,
    service: Arc<Pipeline>,
    shutdown: ShutdownSignal,
    binding: watch::Sender<Binding>,
}

impl Listener {
    async fn run(self) -> Result<(), ServerError> {
        let listener = match self.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                self.binding.send_replace(Binding::Failed);
                return Err(e);
            }
        };

        let mut connections = JoinSet::new();
        let stop = self.shutdown.recv();
        tokio::pin!(stop);
        let mut failures = 0u32;
        let mut backoff = ACCEPT_BACKOFF_START;

        loop {
            tokio::select! {
                () = &mut stop => break,
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "connection task panicked");
                        }
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        failures = 0;
                        backoff = ACCEPT_BACKOFF_START;
                        connections.spawn(serve_connection(
                            stream,
                            remote_addr,
                            Arc::clone(&self.service),
                            self.keep_alive,
                            self.shutdown.clone(),
                        ));
                    }
                    Err(e) if is_connection_error(&e) => {
                        tracing::debug!(error = %e, "connection failed during accept");
                    }
                    Err(e) => {
                        failures += 1;
                        if failures > MAX_ACCEPT_FAILURES {
                            return Err(ServerError::Accept(e.to_string()));
                        }
                        tracing::warn!(error = %e, retry_in = ?backoff, "failed to accept connection");
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(ACCEPT_BACKOFF_MAX);
                    }
                },
            }
        }

        drop(listener);
        tracing::info!(connections = connections.len(), "draining connections");
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                tracing::debug!(error = %e, "connection task ended abnormally");
            }
        }
        Ok(())
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {}: {}", self.addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        self.binding.send_replace(Binding::Bound(local_addr));
        tracing::info!(addr = %local_addr, keep_alive = self.keep_alive, "server listening");
        Ok(listener)
    }
}

/// Errors that only concern the connection being accepted.
fn is_connection_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
    )
}

/// Handles a single connection until it closes or shutdown drains it.
async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    service: Arc<Pipeline>,
    keep_alive: bool,
    shutdown: ShutdownSignal,
) {
    let io = TokioIo::new(stream);
    let svc = service_fn(move |request: http::Request<hyper::body::Incoming>| {
        let service = Arc::clone(&service);
        async move { Ok::<_, Infallible>(dispatch(service.as_ref(), request).await) }
    });

    let conn = http1::Builder::new()
        .keep_alive(keep_alive)
        .serve_connection(io, svc);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.as_mut().await
        }
    };

    if let Err(e) = result {
        tracing::debug!(remote = %remote_addr, error = %e, "connection error");
    }
}
