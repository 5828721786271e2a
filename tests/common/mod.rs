//! Common test utilities for ircwarden integration tests
//!
//! This module provides:
//! - `FakeServer` / `FakeConnector` for driving the bot over in-memory streams
//! - `TestBot` for running a full bot (console, dispatcher, supervisor)

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod fake_server;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use ircwarden::{Bot, Result, SessionConfig, SessionReport, SessionState, Store};

pub use fake_server::{FakeConnector, FakeServer, LINE_TIMEOUT};

pub const NICK: &str = "bot";

/// Config used by most tests
pub fn test_config() -> SessionConfig {
    SessionConfig {
        server: "fake".to_string(),
        port: 6667,
        nick: NICK.to_string(),
        tls: false,
        reconnect_delay_secs: 60,
        ..SessionConfig::default()
    }
}

/// A running bot wired to fake servers and a scripted console
pub struct TestBot {
    pub servers: mpsc::UnboundedReceiver<FakeServer>,
    pub attempts: Arc<Mutex<Vec<Instant>>>,
    pub console: DuplexStream,
    pub shutdown: CancellationToken,
    pub state: watch::Receiver<SessionState>,
    pub handle: JoinHandle<Result<SessionReport>>,
}

impl TestBot {
    pub fn start(config: SessionConfig) -> Self {
        Self::start_with(config, None, None)
    }

    pub fn start_with(
        config: SessionConfig,
        accept_limit: Option<usize>,
        store: Option<Arc<Store>>,
    ) -> Self {
        let (connector, servers, attempts) = FakeConnector::new(accept_limit);
        Self::launch(config, connector, servers, attempts, store)
    }

    /// Start a bot whose first `count` connections are closed before registration
    pub fn start_closed_first(config: SessionConfig, count: usize) -> Self {
        let (connector, servers, attempts) = FakeConnector::new(None);
        Self::launch(config, connector.closed_first(count), servers, attempts, None)
    }

    fn launch(
        config: SessionConfig,
        connector: FakeConnector,
        servers: mpsc::UnboundedReceiver<FakeServer>,
        attempts: Arc<Mutex<Vec<Instant>>>,
        store: Option<Arc<Store>>,
    ) -> Self {
        let (console, console_input) = tokio::io::duplex(4096);

        let mut bot = Bot::new(Arc::new(config), connector);
        if let Some(store) = store {
            bot = bot.with_store(store);
        }
        let shutdown = bot.shutdown_token();
        let state = bot.subscribe();
        let handle = tokio::spawn(bot.run(BufReader::new(console_input)));

        Self {
            servers,
            attempts,
            console,
            shutdown,
            state,
            handle,
        }
    }

    /// Wait for the next generation's server and consume its registration
    pub async fn accept(&mut self) -> FakeServer {
        let mut server = self
            .servers
            .recv()
            .await
            .expect("Bot stopped connecting");
        server.expect_registration(NICK).await;
        server
    }

    /// Type a line on the operator console
    pub async fn type_line(&mut self, line: &str) {
        self.console
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("Failed to write console line");
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().clone()
    }

    /// Wait for the bot to terminate
    pub async fn finish(self) -> Result<SessionReport> {
        tokio::time::timeout(LINE_TIMEOUT, self.handle)
            .await
            .expect("Bot did not terminate")
            .expect("Bot task panicked")
    }
}

/// A channel message from `alice!~a@host`
pub fn from_alice(target: &str, text: &str) -> String {
    format!(":alice!~a@host PRIVMSG {} :{}", target, text)
}
