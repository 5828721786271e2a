//! Chat command handlers and the registry that names them
//!
//! ## Architecture
//!
//! Each handler is a plain async function taking an [`Invocation`] by value.
//! The dispatcher looks the command name up in the [`CommandRegistry`]
//! (case-insensitively) and spawns [`CommandRegistry::invoke`] as its own
//! task. Handler modules group commands by what they touch:
//!
//! - `info` - help, command list, configured links, botsnack
//! - `games` - dice, coin, yes/no answers
//! - `system` - uptime, memory footprint, fortune
//! - `remote` - HTTP-backed commands (excuse, commit)
//! - `stats` - channel log statistics (wc, top)
//! - `account` - PIN verification against the store
//! - `admin` - kick, join
//!
//! A handler that fails returns a [`CommandError`]; the registry turns it
//! into an `ERROR: ...` reply to the caller.

pub mod account;
pub mod admin;
pub mod games;
pub mod info;
pub mod remote;
pub mod stats;
pub mod system;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::SessionConfig;
use crate::error::BotError;
use crate::queue::Outbound;
use crate::store::Store;

/// User-facing handler failure
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid number of arguments")]
    Arity,

    #[error("{0}")]
    Usage(String),

    #[error("{what} is not available")]
    Unavailable { what: String },

    #[error("{message}")]
    Failed { message: String },
}

impl From<BotError> for CommandError {
    fn from(e: BotError) -> Self {
        Self::Failed {
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        Self::Failed {
            message: e.to_string(),
        }
    }
}

impl From<reqwest::Error> for CommandError {
    fn from(e: reqwest::Error) -> Self {
        Self::Failed {
            message: format!("request failed: {}", e),
        }
    }
}

pub type CommandResult = std::result::Result<(), CommandError>;

/// Shared read-only services handed to every invocation
pub struct Services {
    pub config: Arc<SessionConfig>,
    pub store: Option<Arc<Store>>,
    pub http: reqwest::Client,
    pub registry: Arc<CommandRegistry>,
}

impl Services {
    pub fn new(
        config: Arc<SessionConfig>,
        store: Option<Arc<Store>>,
        registry: Arc<CommandRegistry>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            config,
            store,
            http,
            registry,
        }
    }

    /// The store, or an error naming it as unavailable
    pub fn store(&self) -> Result<&Store, CommandError> {
        self.store.as_deref().ok_or_else(|| CommandError::Unavailable {
            what: "The account store".to_string(),
        })
    }
}

/// One command call, owning everything the handler needs
pub struct Invocation {
    pub out: Outbound,
    /// Channel the command came from, or the sender for private messages
    pub reply_to: String,
    pub nick: String,
    pub host: String,
    pub args: Vec<String>,
    pub services: Arc<Services>,
}

impl Invocation {
    /// Send `PRIVMSG <reply_to> :<text>`
    pub fn reply(&self, text: impl AsRef<str>) {
        self.out.privmsg(&self.reply_to, text.as_ref());
    }

    pub fn config(&self) -> &SessionConfig {
        &self.services.config
    }

    /// Fail unless exactly `n` arguments were given
    pub fn expect_args(&self, n: usize) -> Result<(), CommandError> {
        if self.args.len() == n {
            Ok(())
        } else {
            Err(CommandError::Arity)
        }
    }

    /// Whether the reply goes to a channel rather than a private query
    pub fn in_channel(&self) -> bool {
        self.reply_to.starts_with(['#', '&', '+', '!'])
    }
}

/// Handler entry point stored in the registry
pub type Handler = fn(Invocation) -> BoxFuture<'static, CommandResult>;

/// A named command with its help line
#[derive(Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub handler: Handler,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Immutable name -> handler table, built once at startup
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        info::register(&mut registry);
        games::register(&mut registry);
        system::register(&mut registry);
        remote::register(&mut registry);
        stats::register(&mut registry);
        account::register(&mut registry);
        admin::register(&mut registry);
        registry
    }

    pub fn register(&mut self, spec: CommandSpec) {
        self.commands.insert(spec.name.to_ascii_lowercase(), spec);
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn help(&self, name: &str) -> Option<&'static str> {
        self.get(name).map(|spec| spec.help)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run a command to completion, replying with the error if it fails
    pub async fn invoke(spec: CommandSpec, invocation: Invocation) {
        let out = invocation.out.clone();
        let reply_to = invocation.reply_to.clone();
        tracing::debug!(
            "Running '{}' for {}@{} in {}",
            spec.name,
            invocation.nick,
            invocation.host,
            reply_to
        );
        if let Err(e) = (spec.handler)(invocation).await {
            tracing::warn!("Command '{}' failed: {}", spec.name, e);
            out.privmsg(&reply_to, &format!("ERROR: {}", e));
        }
    }
}
