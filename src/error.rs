//! Error types and exit codes for ircwarden

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for ircwarden operations
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Could not connect to {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("TLS error: {message}")]
    Tls { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Connection closed by server")]
    Disconnected,

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Convert error to process exit code:
    /// - 0: Success
    /// - 1: IO error
    /// - 2: Configuration error
    /// - 3: No transport could be established
    /// - 4: Store error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config { .. } => ExitCode::from(2),
            Self::Connect { .. } | Self::Tls { .. } => ExitCode::from(3),
            Self::Transport { .. } | Self::Disconnected => ExitCode::from(3),
            Self::Store { .. } => ExitCode::from(4),
            Self::Io(_) => ExitCode::from(1),
        }
    }

    /// Whether the supervisor should treat this as a recoverable transport failure
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Disconnected | Self::Io(_)
        )
    }
}

impl From<rusqlite::Error> for BotError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store {
            message: e.to_string(),
        }
    }
}

/// Result type alias for ircwarden operations
pub type Result<T> = std::result::Result<T, BotError>;
