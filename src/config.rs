//! Session configuration.
//!
//! Loaded once at startup from:
//! - `--config <path>` when given
//! - otherwise `~/.config/ircwarden/config.toml` (platform config dir)
//!
//! A missing file falls back to [`SessionConfig::default`]. Files ending in
//! `.json` are parsed as JSON, everything else as TOML.
//!
//! ```toml
//! server = "irc.libera.chat"
//! port = 6697
//! nick = "ircwarden"
//! tls = true
//! admins = ["alice@alice.users.example.org"]
//!
//! [links]
//! source = "https://git.example.org/ircwarden"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

/// Immutable configuration for one process lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Server hostname
    pub server: String,
    /// Server port
    pub port: u16,
    /// Nickname to register with
    pub nick: String,
    /// NickServ password, sent with IDENTIFY after registration
    pub nickserv_password: Option<String>,
    /// Hostname field of the USER registration line
    pub hostname: String,
    /// Realname field of the USER registration line
    pub realname: String,
    /// Attempt a TLS connection first
    pub tls: bool,
    /// Retry over plaintext when the TLS connection fails
    pub plaintext_fallback: bool,
    /// Administrator identities, written as `nick@host`
    pub admins: Vec<AdminIdentity>,
    /// Seconds to wait before reconnecting after a dropped connection
    pub reconnect_delay_secs: u64,
    /// Prefix character that marks a command (`+dice`)
    pub trigger: char,
    /// Maximum number of command handlers running at once
    pub max_in_flight: usize,
    /// Path of the SQLite verification store
    pub store_path: Option<PathBuf>,
    /// Directory holding `<channel>.log` files for `wc` and `top`
    pub channel_log_dir: Option<PathBuf>,
    /// Links returned by informational commands
    pub links: LinksConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server: "irc.libera.chat".to_string(),
            port: 6697,
            nick: "ircwarden".to_string(),
            nickserv_password: None,
            hostname: "*".to_string(),
            realname: "ircwarden".to_string(),
            tls: true,
            plaintext_fallback: true,
            admins: Vec::new(),
            reconnect_delay_secs: 60,
            trigger: '+',
            max_in_flight: 32,
            store_path: None,
            channel_log_dir: None,
            links: LinksConfig::default(),
        }
    }
}

/// URLs handed out by the `source`, `web`, `register` and `login` commands
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub source: Option<String>,
    pub home: Option<String>,
    pub register: Option<String>,
    pub login: Option<String>,
}

impl SessionConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config: Self = if is_json {
            serde_json::from_str(&content).map_err(|e| BotError::Config {
                message: format!("Failed to parse {}: {}", path.display(), e),
            })?
        } else {
            toml::from_str(&content).map_err(|e| BotError::Config {
                message: format!("Failed to parse {}: {}", path.display(), e),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.nick.is_empty() || self.nick.contains(char::is_whitespace) {
            return Err(BotError::Config {
                message: format!("Invalid nick '{}'", self.nick),
            });
        }
        if self.server.is_empty() {
            return Err(BotError::Config {
                message: "Server must not be empty".to_string(),
            });
        }
        if self.max_in_flight == 0 {
            return Err(BotError::Config {
                message: "max_in_flight must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// `host:port` of the configured server
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Whether `nick@host` is listed as an administrator
    pub fn is_admin(&self, nick: &str, host: &str) -> bool {
        self.admins.iter().any(|a| a.nick == nick && a.host == host)
    }

    /// Store path, defaulting to the platform data directory
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        self.store_path
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("ircwarden").join("store.sqlite3")))
    }
}

/// `~/.config/ircwarden/config.toml` (or platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ircwarden").join("config.toml"))
}

/// An administrator, identified by nick and host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdminIdentity {
    pub nick: String,
    pub host: String,
}

impl FromStr for AdminIdentity {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('@') {
            Some((nick, host)) if !nick.is_empty() && !host.is_empty() => Ok(Self {
                nick: nick.to_string(),
                host: host.to_string(),
            }),
            _ => Err(BotError::Config {
                message: format!("Admin entry '{}' is not of the form nick@host", s),
            }),
        }
    }
}

impl TryFrom<String> for AdminIdentity {
    type Error = BotError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<AdminIdentity> for String {
    fn from(a: AdminIdentity) -> Self {
        a.to_string()
    }
}

impl fmt::Display for AdminIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.nick, self.host)
    }
}
