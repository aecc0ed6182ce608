//! Server implementation
//!
//! The Server owns the listener loop: accept a connection, spawn a handler
//! task for it, keep accepting. Handlers are independent; a failing
//! connection never takes the listener down.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::client::{Approver, TcpApprover};
use crate::config::Config;
use crate::errors::Error;
use crate::server::connection::handle_connection;
use crate::storage::DirectoryStore;

/// RKSOK server: configuration, the shared directory store, and the
/// approver seam.
pub struct Server {
    config: Arc<Config>,
    store: Arc<DirectoryStore>,
    approver: Arc<dyn Approver>,
}

impl Server {
    /// Create a new server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Bind the configured listen address and serve until the task is
    /// cancelled.
    pub async fn run(&self) -> Result<(), Error> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .map_err(|e| {
                Error::Transport(format!("cannot bind {}: {e}", self.config.listen_addr))
            })?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener. Useful when the caller needs the
    /// ephemeral port before the accept loop starts.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Error> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| Error::Transport(format!("listener has no local address: {e}")))?;
        info!(%local_addr, store = %self.store.path().display(), "serving РКСОК/1.0");

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    // Transient accept failures (EMFILE and friends) must
                    // not kill the listener
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };
            tokio::spawn(handle_connection(
                stream,
                peer,
                self.store.clone(),
                self.approver.clone(),
                self.config.clone(),
            ));
        }
    }

    /// The directory store this server mutates.
    pub fn store(&self) -> Arc<DirectoryStore> {
        self.store.clone()
    }
}

/// Builder for configuring and creating a Server
pub struct ServerBuilder {
    config: Option<Config>,
    store: Option<Arc<DirectoryStore>>,
    approver: Option<Arc<dyn Approver>>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            approver: None,
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the directory store. Defaults to a store over the configured
    /// store path.
    pub fn with_store(mut self, store: Arc<DirectoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the approver. Defaults to a [`TcpApprover`] against the
    /// configured gatekeeper endpoint.
    pub fn with_approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = Some(approver);
        self
    }

    /// Build the server with the configured options
    pub fn build(self) -> Server {
        let config = Arc::new(self.config.unwrap_or_default());
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(DirectoryStore::new(config.store_path.clone())));
        let approver = self.approver.unwrap_or_else(|| {
            Arc::new(TcpApprover::new(
                config.gatekeeper_addr.clone(),
                config.encoding,
                config.approval_timeout(),
            ))
        });
        Server {
            config,
            store,
            approver,
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
