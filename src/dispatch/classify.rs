//! Line classification
//!
//! An ordered list of matchers; the first one that recognizes a line wins.
//! The order is part of the protocol contract:
//!
//! 1. keepalive ping
//! 2. CTCP request to the bot
//! 3. question addressed to the bot
//! 4. command invocation

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::commands::CommandRegistry;
use crate::config::SessionConfig;
use crate::error::{BotError, Result};

use super::event::{DispatchEvent, Sender};

static PRIVMSG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^:([^!\s]+)!([^@\s]+)@(\S+) PRIVMSG (\S+) :(.*)$").expect("valid regex")
});

/// A parsed `PRIVMSG` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privmsg<'a> {
    pub nick: &'a str,
    pub user: &'a str,
    pub host: &'a str,
    pub target: &'a str,
    pub text: &'a str,
}

impl<'a> Privmsg<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = PRIVMSG.captures(line)?;
        let get = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
        Some(Self {
            nick: get(1),
            user: get(2),
            host: get(3),
            target: get(4),
            text: get(5),
        })
    }

    pub fn sender(&self) -> Sender {
        Sender {
            nick: self.nick.to_string(),
            user: self.user.to_string(),
            host: self.host.to_string(),
        }
    }

    /// Whether the message was sent directly to `own_nick` rather than a channel
    pub fn is_private_to(&self, own_nick: &str) -> bool {
        self.target.eq_ignore_ascii_case(own_nick)
    }

    /// Where a reply belongs: the channel, or the sender for private messages
    pub fn reply_to(&self, own_nick: &str) -> String {
        if self.is_private_to(own_nick) {
            self.nick.to_string()
        } else {
            self.target.to_string()
        }
    }
}

/// One classification rule
pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// `msg` is the line pre-parsed as a `PRIVMSG`, when it is one
    fn classify(&self, line: &str, msg: Option<&Privmsg<'_>>) -> Option<DispatchEvent>;
}

/// `PING <token>` from the server
pub struct PingMatcher;

impl Matcher for PingMatcher {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn classify(&self, line: &str, _msg: Option<&Privmsg<'_>>) -> Option<DispatchEvent> {
        let token = line.strip_prefix("PING ")?;
        Some(DispatchEvent::Ping {
            token: token.to_string(),
        })
    }
}

/// `\x01TYPE args\x01` sent privately to the bot
pub struct CtcpMatcher {
    nick: String,
}

impl Matcher for CtcpMatcher {
    fn name(&self) -> &'static str {
        "ctcp"
    }

    fn classify(&self, _line: &str, msg: Option<&Privmsg<'_>>) -> Option<DispatchEvent> {
        let msg = msg?;
        if !msg.is_private_to(&self.nick) {
            return None;
        }
        let body = msg
            .text
            .strip_prefix('\x01')?
            .strip_suffix('\x01')?;
        let mut words = body.split_whitespace();
        let kind = words.next()?.to_ascii_uppercase();
        Some(DispatchEvent::OutOfBand {
            sender: msg.sender(),
            target: msg.target.to_string(),
            kind,
            args: words.map(str::to_string).collect(),
        })
    }
}

/// Text starting with the bot's nick and ending in `?`
pub struct QuestionMatcher {
    nick: String,
}

impl QuestionMatcher {
    fn addresses_bot(&self, text: &str) -> bool {
        let head = match text.get(..self.nick.len()) {
            Some(head) => head,
            None => return false,
        };
        if !head.eq_ignore_ascii_case(&self.nick) {
            return false;
        }
        // "bot2: hi?" is not addressed to "bot"
        !text[self.nick.len()..]
            .chars()
            .next()
            .map(|c| c.is_alphanumeric() || c == '_')
            .unwrap_or(false)
    }
}

impl Matcher for QuestionMatcher {
    fn name(&self) -> &'static str {
        "question"
    }

    fn classify(&self, _line: &str, msg: Option<&Privmsg<'_>>) -> Option<DispatchEvent> {
        let msg = msg?;
        if !self.addresses_bot(msg.text) || !msg.text.trim_end().ends_with('?') {
            return None;
        }
        Some(DispatchEvent::Question {
            sender: msg.sender(),
            target: msg.target.to_string(),
            reply_to: msg.reply_to(&self.nick),
        })
    }
}

/// `<nick><sep> cmd args`, `<trigger>cmd args`, or any private text
pub struct CommandMatcher {
    nick: String,
    addressed: Regex,
    triggered: Regex,
    registry: Arc<CommandRegistry>,
}

impl CommandMatcher {
    pub fn new(config: &SessionConfig, registry: Arc<CommandRegistry>) -> Result<Self> {
        let build = |pattern: String| {
            Regex::new(&pattern).map_err(|e| BotError::Config {
                message: format!("Invalid command pattern: {}", e),
            })
        };
        Ok(Self {
            nick: config.nick.clone(),
            addressed: build(format!(
                r"^(?i:{})(?:[^\w\s]+\s*|\s+)(\S.*)$",
                regex::escape(&config.nick)
            ))?,
            triggered: build(format!(
                r"^\s*{}(.*)$",
                regex::escape(&config.trigger.to_string())
            ))?,
            registry,
        })
    }

    /// Command text after the addressing form, if any form applies
    fn command_text<'a>(&self, msg: &Privmsg<'a>) -> Option<&'a str> {
        if let Some(caps) = self.addressed.captures(msg.text) {
            return caps.get(1).map(|m| m.as_str());
        }
        if let Some(caps) = self.triggered.captures(msg.text) {
            return caps.get(1).map(|m| m.as_str());
        }
        if msg.is_private_to(&self.nick) {
            return Some(msg.text);
        }
        None
    }
}

impl Matcher for CommandMatcher {
    fn name(&self) -> &'static str {
        "command"
    }

    fn classify(&self, _line: &str, msg: Option<&Privmsg<'_>>) -> Option<DispatchEvent> {
        let msg = msg?;
        let mut words = self.command_text(msg)?.split_whitespace();
        let name = words.next()?.to_ascii_lowercase();
        if !self.registry.contains(&name) {
            return Some(DispatchEvent::Unrecognized);
        }
        Some(DispatchEvent::Command {
            sender: msg.sender(),
            target: msg.target.to_string(),
            reply_to: msg.reply_to(&self.nick),
            name,
            args: words.map(str::to_string).collect(),
        })
    }
}

/// Ordered matcher list, built once and shared
pub struct Classifier {
    matchers: Vec<Box<dyn Matcher>>,
}

impl Classifier {
    pub fn new(config: &SessionConfig, registry: Arc<CommandRegistry>) -> Result<Self> {
        let matchers: Vec<Box<dyn Matcher>> = vec![
            Box::new(PingMatcher),
            Box::new(CtcpMatcher {
                nick: config.nick.clone(),
            }),
            Box::new(QuestionMatcher {
                nick: config.nick.clone(),
            }),
            Box::new(CommandMatcher::new(config, registry)?),
        ];
        Ok(Self { matchers })
    }

    #[cfg(test)]
    fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    pub fn classify(&self, line: &str) -> DispatchEvent {
        let msg = Privmsg::parse(line);
        self.matchers
            .iter()
            .find_map(|m| m.classify(line, msg.as_ref()))
            .unwrap_or(DispatchEvent::Unrecognized)
    }
}
