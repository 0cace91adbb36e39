//! Graceful shutdown signal handling.
//!
//! [`ShutdownSignal`] tells the accept loop and every open connection to
//! stop. [`wait_for_os_signal`] resolves on SIGTERM or SIGINT (Ctrl+C on
//! other platforms) and is what the binary races against server crashes.
//!
//! # Example
//!
//! ```rust
//! use logcollector_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! let for_connection = shutdown.clone();
//!
//! shutdown.trigger();
//! assert!(for_connection.is_shutdown());
//! ```

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::sync::watch;

/// A signal that can be used to trigger and await graceful shutdown.
///
/// It can be cloned and shared; all clones observe the same trigger.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates a new shutdown signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Triggers the shutdown signal.
    ///
    /// Calling this multiple times is safe and idempotent.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Returns `true` if shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Returns a future that completes when shutdown is triggered.
    ///
    /// If shutdown has already been triggered, the future completes
    /// immediately. The future does not borrow the signal.
    pub fn recv(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.sender.subscribe();
        async move {
            // Err means every sender is gone, which also ends the wait.
            let _ = receiver.wait_for(|triggered| *triggered).await;
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for an OS shutdown signal.
///
/// On Unix systems, this waits for SIGTERM or SIGINT.
/// On other systems, this only waits for Ctrl+C.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be registered.
pub async fn wait_for_os_signal() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, initiating graceful shutdown");
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, initiating graceful shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("received Ctrl+C, initiating graceful shutdown");
    }

    Ok(())
}
