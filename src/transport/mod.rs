//! Socket transport for one connection generation
//!
//! # Architecture
//!
//! ```text
//!   Connector::connect() ──► Connection { stream }
//!                                 │ tokio::io::split
//!                ┌────────────────┴────────────────┐
//!                ▼                                 ▼
//!   FramedRead<ReadHalf, LineCodec>   FramedWrite<WriteHalf, LineCodec>
//!                │                                 ▲
//!          run_reader ──► inbound queue      outbound queue ──► run_writer
//! ```
//!
//! Each half is owned by exactly one worker task for the lifetime of the
//! generation. The [`Connector`] trait is the seam tests use to hand the
//! supervisor in-memory streams instead of sockets.

pub mod reader;
pub mod tls;
pub mod writer;

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::config::SessionConfig;
use crate::error::{BotError, Result};

pub use reader::run_reader;
pub use writer::run_writer;

/// Any bidirectional byte stream the session can run over
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

/// Type-erased stream (plain TCP, TLS, or an in-memory duplex in tests)
pub type BoxedStream = Box<dyn AsyncStream>;

/// An established connection, before registration
pub struct Connection {
    pub stream: BoxedStream,
    /// Whether the stream is encrypted
    pub secure: bool,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

/// Opens a new connection for each generation
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> impl Future<Output = Result<Connection>> + Send;
}

/// Connects to the configured server over TCP, with TLS when enabled
pub struct TcpConnector {
    config: Arc<SessionConfig>,
}

impl TcpConnector {
    pub fn new(config: Arc<SessionConfig>) -> Self {
        Self { config }
    }

    async fn connect_plain(&self) -> Result<TcpStream> {
        let endpoint = self.config.endpoint();
        tracing::info!("Connecting to {}...", endpoint);
        TcpStream::connect((self.config.server.as_str(), self.config.port))
            .await
            .map_err(|e| BotError::Connect {
                endpoint,
                message: e.to_string(),
            })
    }
}

/// Decide what a TLS attempt leaves us with.
///
/// `Ok(Some(stream))` is a secure stream, `Ok(None)` means retry in
/// plaintext, and `Err` fails the connect.
pub fn tls_outcome<S>(attempt: Result<S>, plaintext_fallback: bool) -> Result<Option<S>> {
    match attempt {
        Ok(stream) => Ok(Some(stream)),
        Err(e) if plaintext_fallback => {
            tracing::warn!("TLS connection failed ({}), falling back to plaintext", e);
            Ok(None)
        }
        Err(e) => {
            tracing::error!("TLS connection failed ({}), plaintext fallback disabled", e);
            Err(e)
        }
    }
}

impl Connector for TcpConnector {
    async fn connect(&self) -> Result<Connection> {
        if self.config.tls {
            tracing::info!("Connecting to {} with TLS...", self.config.endpoint());
            let attempt = async {
                let tcp = self.connect_plain().await?;
                tls::wrap(tcp, &self.config.server).await
            };
            if let Some(stream) = tls_outcome(attempt.await, self.config.plaintext_fallback)? {
                return Ok(Connection {
                    stream: Box::new(stream),
                    secure: true,
                });
            }
        }

        let tcp = self.connect_plain().await?;
        Ok(Connection {
            stream: Box::new(tcp),
            secure: false,
        })
    }
}
