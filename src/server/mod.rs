//! HTTP server module
//!
//! Serves the demo routes behind the APM middleware. Every connection gets a
//! clone of the [`Traced`](crate::transaction::Traced) service, so every
//! request runs inside its own transaction.
//!
//! # Example
//!
//! ```no_run
//! use apm_segments::config::{ApmConfig, ServerConfig};
//! use apm_segments::server::Server;
//! use apm_segments::transaction::Application;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = Application::new(&ApmConfig {
//!     app_name: "orders-api".into(),
//!     license_key: String::new(),
//!     enabled: false,
//! })?;
//! let mut server = Server::new(ServerConfig { address: "127.0.0.1:0".into() }, app)?;
//! let addr = server.start().await?;
//! println!("listening on {}", addr);
//! server.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod routes;

use crate::config::ServerConfig;
use crate::transaction::Application;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Server error: {0}")]
    RuntimeError(String),
}

/// HTTP Server
pub struct Server {
    addr: SocketAddr,
    app: Application,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: ServerConfig, app: Application) -> Result<Self, ServerError> {
        let addr: SocketAddr = config
            .address
            .parse()
            .map_err(|e| ServerError::BindError(format!("{}: {}", config.address, e)))?;

        Ok(Self {
            addr,
            app,
            shutdown_tx: None,
            server_handle: None,
        })
    }

    /// Start accepting connections in the background
    ///
    /// Returns the actual bound address (useful when using port 0)
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(self.addr).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let app = self.app.clone();
        let handle = tokio::spawn(async move {
            accept_loop(listener, app, shutdown_rx).await;
        });
        self.server_handle = Some(handle);

        info!(%addr, app_name = self.app.app_name(), apm_enabled = self.app.is_enabled(), "server listening");
        Ok(addr)
    }

    /// Stop accepting connections and wait for the accept loop to exit
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }

    /// Run until ctrl-c
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.start().await?;

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| ServerError::RuntimeError(e.to_string()))?;

        info!("Shutting down server");
        self.shutdown().await;
        Ok(())
    }
}

/// Accept connections until shutdown is signalled
async fn accept_loop(listener: TcpListener, app: Application, mut shutdown_rx: oneshot::Receiver<()>) {
    let service = app.handler(service_fn(routes::route::<Incoming>));

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let io = TokioIo::new(stream);
                        let service = service.clone();
                        tokio::spawn(async move {
                            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                debug!(%peer, error = %e, "connection closed with error");
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                }
            }
        }
    }
}
