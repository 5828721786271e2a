//! ircwarden: an always-on IRC client core
//!
//! Keeps a single session alive against one server, reconnecting with a
//! fixed backoff after transport failures, and routes every inbound line to
//! protocol handling (keepalive, CTCP) or to a registry of chat commands.
//!
//! # Modules
//!
//! - [`session`] - connect/handshake/reconnect supervisor and generations
//! - [`transport`] - socket connectors, reader and writer workers
//! - [`dispatch`] - line classification and routing
//! - [`commands`] - command registry and handler bodies
//! - [`console`] - operator stdin forwarding
//! - [`store`] - SQLite key-value store for account verification
//!
//! # Example
//!
//! ```ignore
//! use ircwarden::{Bot, SessionConfig};
//!
//! let config = SessionConfig::load()?;
//! let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//! let report = Bot::from_config(config).run(stdin).await?;
//! println!("ran {} generation(s)", report.generations);
//! ```

pub mod bot;
pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod queue;
pub mod session;
pub mod store;
pub mod transport;

// Re-export commonly used types
pub use bot::Bot;
pub use cli::{Cli, Commands};
pub use commands::{CommandRegistry, Invocation, Services};
pub use config::{AdminIdentity, SessionConfig};
pub use dispatch::{DispatchEvent, Dispatcher};
pub use error::{BotError, Result};
pub use session::{SessionReport, SessionState, Supervisor};
pub use store::Store;
pub use transport::{Connection, Connector, TcpConnector};
