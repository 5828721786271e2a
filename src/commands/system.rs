//! Commands that report on the local machine

use futures_util::FutureExt;
use tokio::process::Command;

use super::{CommandError, CommandRegistry, CommandResult, CommandSpec, Invocation};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandSpec {
        name: "uptime",
        help: "Returns output from execution of 'uptime' command",
        handler: |inv| uptime(inv).boxed(),
    });
    registry.register(CommandSpec {
        name: "footprint",
        help: "Displays resident memory usage of bot",
        handler: |inv| footprint(inv).boxed(),
    });
    registry.register(CommandSpec {
        name: "offensive",
        help: "Displays a potentially offensive statement.",
        handler: |inv| offensive(inv).boxed(),
    });
}

/// Run a program and return its stdout
async fn run_program(program: &str, args: &[&str]) -> Result<String, CommandError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| CommandError::Failed {
            message: format!("could not run '{}': {}", program, e),
        })?;
    if !output.status.success() {
        return Err(CommandError::Failed {
            message: format!("'{}' exited with {}", program, output.status),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn uptime(inv: Invocation) -> CommandResult {
    let out = run_program("uptime", &[]).await?;
    inv.reply(out.trim());
    Ok(())
}

/// Extract the `VmRSS` value from `/proc/<pid>/status` contents
pub fn parse_vm_rss(status: &str) -> Option<&str> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .map(str::trim)
}

async fn footprint(inv: Invocation) -> CommandResult {
    let status = tokio::fs::read_to_string("/proc/self/status").await?;
    let rss = parse_vm_rss(&status).ok_or_else(|| CommandError::Unavailable {
        what: "Memory usage".to_string(),
    })?;
    inv.reply(rss);
    Ok(())
}

/// Fold a multi-line fortune onto one chat line
pub fn flatten_fortune(text: &str) -> String {
    text.trim_end_matches('\n')
        .replace('\t', "  ")
        .replace('\n', " // ")
        .trim()
        .to_string()
}

async fn offensive(inv: Invocation) -> CommandResult {
    let out = run_program("fortune", &["-os"]).await?;
    inv.reply(flatten_fortune(&out));
    Ok(())
}
