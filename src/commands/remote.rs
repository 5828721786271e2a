//! HTTP-backed commands

use futures_util::FutureExt;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;

use super::{CommandError, CommandRegistry, CommandResult, CommandSpec, Invocation};

const EXCUSE_URL: &str = "http://programmingexcuses.com/";
const GITHUB_API: &str = "https://api.github.com";

static EXCUSE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<a href="/" rel="nofollow" [^>]*>(.*?)</a>"#).expect("valid regex"));

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandSpec {
        name: "excuse",
        help: "Fetches an excuse from http://programmingexcuses.com/",
        handler: |inv| excuse(inv).boxed(),
    });
    registry.register(CommandSpec {
        name: "commit",
        help: "Displays random commit message from github",
        handler: |inv| commit(inv).boxed(),
    });
}

/// Pull the excuse text out of the page body
pub fn extract_excuse(body: &str) -> Option<&str> {
    EXCUSE_LINK
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

async fn excuse(inv: Invocation) -> CommandResult {
    let body = inv
        .services
        .http
        .get(EXCUSE_URL)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let text = extract_excuse(&body).ok_or_else(|| CommandError::Failed {
        message: "no excuse found on page".to_string(),
    })?;
    inv.reply(text);
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    html_url: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

/// `<first line of message> | <url>`
fn format_commit(entry: &CommitEntry) -> String {
    let summary = entry.commit.message.lines().next().unwrap_or("").trim();
    format!("{} | {}", summary, entry.html_url)
}

async fn commit(inv: Invocation) -> CommandResult {
    let http = &inv.services.http;
    let since: u32 = rand::thread_rng().gen_range(0..1_000_000);

    let repos: Vec<Repository> = http
        .get(format!("{}/repositories?since={}", GITHUB_API, since))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let full_name = repos
        .choose(&mut rand::thread_rng())
        .map(|r| r.full_name.clone())
        .ok_or_else(|| CommandError::Failed {
            message: "No repositories returned".to_string(),
        })?;

    let commits: Vec<CommitEntry> = http
        .get(format!("{}/repos/{}/commits", GITHUB_API, full_name))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let line = commits
        .choose(&mut rand::thread_rng())
        .map(format_commit)
        .ok_or_else(|| CommandError::Failed {
            message: "No commits in selected repository".to_string(),
        })?;
    inv.reply(line);
    Ok(())
}
