//! HTTP server running a handler

use crate::shutdown::ShutdownSignal;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tamp_config::ServerConfig;
use tamp_core::response::responses;
use tamp_core::{Body, Error, Handler, Result};
use tokio::net::TcpListener;

/// Counts a request as in flight until dropped
///
/// hyper drops the service future when the client disconnects, so the
/// decrement has to happen on drop rather than after the handler returns.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// HTTP/1.1 server around a single handler
pub struct Server {
    config: ServerConfig,
    handler: Arc<dyn Handler>,
    shutdown: ShutdownSignal,
    in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl Server {
    /// Create a server for `handler`
    pub fn new(config: ServerConfig, handler: impl Handler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
            shutdown: ShutdownSignal::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get shutdown signal
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.listen).await.map_err(|e| {
            Error::Runtime(format!("Failed to bind to {}: {}", self.config.listen, e))
        })?;

        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr: SocketAddr = listener.local_addr()?;
        tracing::info!(listen = %local_addr, root = %self.config.root.display(), "Server listening");

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::trace!("Accepted connection from {}", addr);
                            self.spawn_connection(stream);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.drain().await;
        Ok(())
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream) {
        let handler = Arc::clone(&self.handler);
        let in_flight = Arc::clone(&self.in_flight);

        tokio::spawn(async move {
            let service = hyper::service::service_fn(move |req: http::Request<hyper::body::Incoming>| {
                let handler = Arc::clone(&handler);
                let in_flight = Arc::clone(&in_flight);
                async move {
                    let _guard = InFlightGuard::enter(in_flight);
                    let result = handler.call(req.map(Body::streaming)).await;

                    result.or_else(|e| {
                        tracing::error!("Request handler error: {}", e);
                        responses::from_error(&e)
                    })
                }
            });

            let io = hyper_util::rt::TokioIo::new(stream);
            if let Err(e) = hyper::server::conn::http1::Builder::new()
                .serve_connection(io, service)
                .await
            {
                tracing::debug!("HTTP connection error: {}", e);
            }
        });
    }

    /// Wait for in-flight requests, bounded by the shutdown timeout
    async fn drain(&self) {
        let timeout = self.config.shutdown_timeout;
        let start = Instant::now();

        loop {
            let active = self.in_flight.load(Ordering::Relaxed);

            if active == 0 {
                tracing::info!("All requests completed, shutting down cleanly");
                break;
            }

            if start.elapsed() >= timeout {
                tracing::warn!(
                    active_requests = active,
                    "Shutdown timeout reached, forcing shutdown"
                );
                break;
            }

            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
