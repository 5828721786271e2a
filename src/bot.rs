//! Process-level wiring
//!
//! Builds the shared queues, registry and services, then runs the
//! long-lived console reader and dispatcher next to the session
//! supervisor. Returns when the supervisor terminates.

use std::sync::Arc;

use tokio::io::AsyncBufRead;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::commands::{CommandRegistry, Services};
use crate::config::SessionConfig;
use crate::console::run_console;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::queue::{inbound_queue, outbound_queue};
use crate::session::{SessionReport, SessionState, Supervisor};
use crate::store::Store;
use crate::transport::{Connector, TcpConnector};

pub struct Bot<C: Connector> {
    config: Arc<SessionConfig>,
    connector: C,
    store: Option<Arc<Store>>,
    shutdown: CancellationToken,
    state: watch::Sender<SessionState>,
}

impl Bot<TcpConnector> {
    /// Bot connecting over real sockets
    pub fn from_config(config: SessionConfig) -> Self {
        let config = Arc::new(config);
        let connector = TcpConnector::new(config.clone());
        Self::new(config, connector)
    }
}

impl<C: Connector> Bot<C> {
    pub fn new(config: Arc<SessionConfig>, connector: C) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            config,
            connector,
            store: None,
            shutdown: CancellationToken::new(),
            state,
        }
    }

    pub fn with_store(mut self, store: Arc<Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Token that stops the whole process when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Run until shutdown (console sentinel, end of console input, or the
    /// shutdown token) or until no transport can be established.
    pub async fn run<R>(self, console: R) -> Result<SessionReport>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (outbound, outbound_rx) = outbound_queue();
        let (inbound_tx, inbound_rx) = inbound_queue();

        let registry = Arc::new(CommandRegistry::with_builtins());
        tracing::info!("Loaded {} commands", registry.len());
        let services = Arc::new(Services::new(
            self.config.clone(),
            self.store.clone(),
            registry,
        ));
        let dispatcher = Dispatcher::new(services, outbound.clone())?;

        let dispatcher_task = tokio::spawn(dispatcher.run(
            inbound_rx,
            self.state.subscribe(),
            self.shutdown.clone(),
        ));
        let console_task = tokio::spawn(run_console(
            console,
            outbound.clone(),
            self.shutdown.clone(),
        ));

        let supervisor = Supervisor::new(
            self.config.clone(),
            self.connector,
            outbound_rx,
            inbound_tx,
            self.shutdown.clone(),
        )
        .with_state_sender(self.state);
        let result = supervisor.run().await;

        self.shutdown.cancel();
        match console_task.await {
            Ok(exit) => tracing::debug!("Console stopped: {:?}", exit),
            Err(e) => tracing::warn!("Console task failed: {}", e),
        }
        if let Err(e) = dispatcher_task.await {
            tracing::warn!("Dispatcher task failed: {}", e);
        }
        drop(outbound);

        result
    }
}
