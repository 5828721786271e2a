//! Channel log statistics
//!
//! Logs are irssi-style text files, one per channel, at
//! `<channel_log_dir>/<channel>.log`. A spoken line looks like
//! `12:34 <@nick> text`, where the mode prefix (`@`, `+`, or a space) is optional.

use std::collections::HashMap;
use std::path::PathBuf;

use futures_util::FutureExt;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{CommandError, CommandRegistry, CommandResult, CommandSpec, Invocation};

static SPEAKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d\d:\d\d <[@+\s]?(\S*?)>").expect("valid regex"));

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandSpec {
        name: "wc",
        help: "Displays number of messages of a user in a channel. Takes one argument, user to query",
        handler: |inv| wc(inv).boxed(),
    });
    registry.register(CommandSpec {
        name: "top",
        help: "Displays top n users by message count in channel. Takes one argument, number of users to show",
        handler: |inv| top(inv).boxed(),
    });
}

/// Lines spoken by `nick` (case-insensitive)
pub fn count_lines_by(log: &str, nick: &str) -> usize {
    log.lines()
        .filter_map(|line| SPEAKER.captures(line))
        .filter(|c| c[1].eq_ignore_ascii_case(nick))
        .count()
}

/// The `n` most active speakers, most lines first; ties broken by nick
pub fn top_speakers(log: &str, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for caps in log.lines().filter_map(|line| SPEAKER.captures(line)) {
        *counts.entry(caps[1].to_lowercase()).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// Insert a zero-width space after the first character so listing a nick
/// does not highlight its owner
pub fn defang_nick(nick: &str) -> String {
    let mut chars = nick.chars();
    match chars.next() {
        Some(first) => format!("{}\u{200B}{}", first, chars.as_str()),
        None => String::new(),
    }
}

fn log_path(inv: &Invocation) -> Result<PathBuf, CommandError> {
    let dir = inv
        .config()
        .channel_log_dir
        .as_ref()
        .ok_or_else(|| CommandError::Unavailable {
            what: "Channel logging".to_string(),
        })?;
    if !inv.in_channel() || inv.reply_to.contains(['/', '\\']) || inv.reply_to.contains("..") {
        return Err(CommandError::Usage(
            "Channel statistics only work in a channel".to_string(),
        ));
    }
    Ok(dir.join(format!("{}.log", inv.reply_to)))
}

async fn read_log(inv: &Invocation) -> Result<String, CommandError> {
    let path = log_path(inv)?;
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| CommandError::Failed {
            message: format!("could not read log for {}: {}", inv.reply_to, e),
        })
}

async fn wc(inv: Invocation) -> CommandResult {
    inv.expect_args(1)?;
    let log = read_log(&inv).await?;
    let nick = &inv.args[0];
    inv.reply(format!("{}: {} lines", nick, count_lines_by(&log, nick)));
    Ok(())
}

async fn top(inv: Invocation) -> CommandResult {
    inv.expect_args(1)?;
    let n = inv.args[0]
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| CommandError::Usage("Must supply a positive integer".to_string()))?;
    let log = read_log(&inv).await?;
    let ranked: Vec<String> = top_speakers(&log, n)
        .into_iter()
        .map(|(nick, lines)| format!("{}: {} lines", defang_nick(&nick), lines))
        .collect();
    if ranked.is_empty() {
        inv.reply("No one has said anything yet");
    } else {
        inv.reply(ranked.join(" || "));
    }
    Ok(())
}
