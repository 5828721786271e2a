//! In-memory stand-in for an IRC server
//!
//! Each successful connect hands the test one [`FakeServer`], the far end of
//! a `tokio::io::duplex` pair whose near end the bot uses as its socket.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::time::Instant;

use ircwarden::{BotError, Connection, Connector, Result};

/// Upper bound on how long a test waits for a line
pub const LINE_TIMEOUT: Duration = Duration::from_secs(5);

/// Server side of one connection
pub struct FakeServer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeServer {
    fn new(stream: DuplexStream) -> Self {
        let (read_half, writer) = tokio::io::split(stream);
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    /// Send one protocol line to the bot
    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .expect("Failed to write to bot");
    }

    /// Next line written by the bot, or `None` once it closed the connection
    pub async fn next_line(&mut self) -> Option<String> {
        let next = tokio::time::timeout(LINE_TIMEOUT, self.lines.next_line())
            .await
            .expect("Timed out waiting for a line from the bot");
        next.ok()
            .flatten()
            .map(|line| line.trim_end_matches('\r').to_string())
    }

    /// Next line, which must exist
    pub async fn expect_line(&mut self) -> String {
        self.next_line().await.expect("Bot closed the connection")
    }

    /// Consume the `NICK`/`USER` registration
    pub async fn expect_registration(&mut self, nick: &str) {
        assert_eq!(self.expect_line().await, format!("NICK {}", nick));
        let user = self.expect_line().await;
        assert!(
            user.starts_with(&format!("USER {} ", nick)),
            "unexpected registration line: {}",
            user
        );
    }

    /// Read lines until `done` returns true for the collected set
    pub async fn collect_until<F>(&mut self, mut done: F) -> Vec<String>
    where
        F: FnMut(&[String]) -> bool,
    {
        let mut lines = Vec::new();
        while !done(&lines) {
            lines.push(self.expect_line().await);
        }
        lines
    }

    /// Drop the connection, as a server-side disconnect
    pub fn disconnect(self) {}
}

/// Connector that serves every attempt from memory
pub struct FakeConnector {
    servers: mpsc::UnboundedSender<FakeServer>,
    attempts: Arc<Mutex<Vec<Instant>>>,
    /// Successful connects allowed before every further attempt is refused
    accept_limit: Option<usize>,
    /// Leading connects whose far end is already closed
    closed_first: usize,
}

impl FakeConnector {
    pub fn new(
        accept_limit: Option<usize>,
    ) -> (Self, mpsc::UnboundedReceiver<FakeServer>, Arc<Mutex<Vec<Instant>>>) {
        let (servers, rx) = mpsc::unbounded_channel();
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let connector = Self {
            servers,
            attempts: attempts.clone(),
            accept_limit,
            closed_first: 0,
        };
        (connector, rx, attempts)
    }

    /// Hand out the first `count` connections with the server side gone
    pub fn closed_first(mut self, count: usize) -> Self {
        self.closed_first = count;
        self
    }
}

impl Connector for FakeConnector {
    async fn connect(&self) -> Result<Connection> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            attempts.push(Instant::now());
            attempts.len()
        };
        if self.accept_limit.is_some_and(|limit| attempt > limit) {
            return Err(BotError::Connect {
                endpoint: "fake:6667".to_string(),
                message: "connection refused".to_string(),
            });
        }

        let (client, server) = tokio::io::duplex(64 * 1024);
        if attempt <= self.closed_first {
            drop(server);
        } else {
            let _ = self.servers.send(FakeServer::new(server));
        }
        Ok(Connection {
            stream: Box::new(client),
            secure: false,
        })
    }
}
