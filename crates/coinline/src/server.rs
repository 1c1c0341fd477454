//! `CoinlineServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → engine, plus the
//! background sweep task that keeps expiries prompt during quiet spells.

use std::sync::Arc;

use coinline_engine::{Clock, QueueEngine};
use coinline_protocol::JsonCodec;
use coinline_store::StateStore;
use coinline_tick::{SweepConfig, SweepScheduler};
use coinline_transport::{Listener, WebSocketListener};

use crate::CoinlineError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerShared<S: StateStore, C: Clock> {
    pub(crate) engine: QueueEngine<S, C>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Coinline server.
///
/// # Example
///
/// ```rust,ignore
/// let engine = QueueEngine::open(config, store, SystemClock).await?;
/// let server = CoinlineServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(engine)
///     .await?;
/// server.run().await
/// ```
pub struct CoinlineServerBuilder {
    bind_addr: String,
    sweep_config: SweepConfig,
}

impl CoinlineServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            sweep_config: SweepConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the background sweep configuration.
    pub fn sweep_config(mut self, config: SweepConfig) -> Self {
        self.sweep_config = config;
        self
    }

    /// Builds the server around an already-opened engine.
    pub async fn build<S: StateStore, C: Clock>(
        self,
        engine: QueueEngine<S, C>,
    ) -> Result<CoinlineServer<S, C>, CoinlineError> {
        let listener = WebSocketListener::bind(&self.bind_addr).await?;
        Ok(CoinlineServer {
            listener,
            sweep_config: self.sweep_config,
            state: Arc::new(ServerShared {
                engine,
                codec: JsonCodec,
            }),
        })
    }
}

impl Default for CoinlineServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Coinline coordinator.
///
/// Call [`run()`](Self::run) to start accepting observer connections.
pub struct CoinlineServer<S: StateStore, C: Clock> {
    listener: WebSocketListener,
    sweep_config: SweepConfig,
    state: Arc<ServerShared<S, C>>,
}

impl<S: StateStore, C: Clock> CoinlineServer<S, C> {
    /// Creates a new builder.
    pub fn builder() -> CoinlineServerBuilder {
        CoinlineServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server: background sweep task plus the accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), CoinlineError> {
        let sweeper = Arc::clone(&self.state);
        let sweep_config = self.sweep_config.clone();
        tokio::spawn(async move {
            let mut scheduler = SweepScheduler::new(sweep_config);
            loop {
                let info = scheduler.wait_for_sweep().await;
                if let Err(e) = sweeper.engine.sweep().await {
                    tracing::warn!(
                        sweep = info.sweep,
                        error = %e,
                        "background sweep failed"
                    );
                }
            }
        });

        tracing::info!("Coinline coordinator running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
