//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};

use super::handlers::SharedEngine;
use super::router;
use crate::error::{NetwardenError, Result};

/// HTTP server for the filter engine.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// The engine handling requests
    engine: SharedEngine,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: SocketAddr, engine: SharedEngine) -> Self {
        Self { addr, engine }
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server fails.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "Starting HTTP server");

        axum::serve(listener, router(self.engine))
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                NetwardenError::Io(e)
            })
    }
}
