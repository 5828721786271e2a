//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Always-on IRC bot with pluggable commands
#[derive(Parser, Debug)]
#[command(name = "ircwarden")]
#[command(about = "Keeps an IRC session alive and answers chat commands")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (TOML, or JSON when ending in .json)
    #[arg(short, long, global = true, env = "IRCWARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show debug logging, including handler activity
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================
// Main Commands Enum
// ============================================

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Connect and stay connected; operator lines on stdin go to the server
    Run,

    /// Generate a fresh verification PIN for a web account
    IssuePin {
        /// Web account name
        username: String,
    },
}

impl Cli {
    /// The subcommand, with `run` as the default
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// Default tracing directive for this invocation
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "ircwarden=debug"
        } else {
            "ircwarden=info"
        }
    }
}
