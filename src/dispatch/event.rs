//! Typed dispatch events

/// Originator of a `PRIVMSG`, from the `:nick!user@host` prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub nick: String,
    pub user: String,
    pub host: String,
}

/// What an inbound line turned out to be.
///
/// Produced by the classifier; consumed immediately by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// Server keepalive, `PING <token>`
    Ping { token: String },
    /// CTCP request sent privately to the bot
    OutOfBand {
        sender: Sender,
        target: String,
        kind: String,
        args: Vec<String>,
    },
    /// Message addressed to the bot ending in `?`
    Question {
        sender: Sender,
        target: String,
        reply_to: String,
    },
    /// A registered command, name lower-cased
    Command {
        sender: Sender,
        target: String,
        reply_to: String,
        name: String,
        args: Vec<String>,
    },
    Unrecognized,
}

impl DispatchEvent {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ping { .. } => "ping",
            Self::OutOfBand { .. } => "ctcp",
            Self::Question { .. } => "question",
            Self::Command { .. } => "command",
            Self::Unrecognized => "unrecognized",
        }
    }
}
