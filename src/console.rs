//! Operator console: stdin lines go straight to the server

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::queue::Outbound;

/// Operator line that ends the process once forwarded
pub const QUIT_SENTINEL: &str = "QUIT";

/// Why the console reader stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// Operator typed the quit sentinel
    Sentinel,
    /// Input closed
    EndOfInput,
    /// Input could not be read
    ReadError,
    /// Global shutdown came from elsewhere
    Cancelled,
}

fn is_sentinel(line: &str) -> bool {
    line.trim() == QUIT_SENTINEL
}

/// Forward operator lines verbatim to the outbound queue.
///
/// Every exit except `Cancelled` requests global shutdown. The sentinel line
/// itself is forwarded first so the server sees the `QUIT`.
pub async fn run_console<R>(input: R, outbound: Outbound, shutdown: CancellationToken) -> ConsoleExit
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let exit = loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => return ConsoleExit::Cancelled,
            next = lines.next_line() => next,
        };
        match next {
            Ok(Some(line)) => {
                let sentinel = is_sentinel(&line);
                if !outbound.send(line) {
                    tracing::debug!("Outbound queue closed, console exiting");
                    break ConsoleExit::EndOfInput;
                }
                if sentinel {
                    tracing::info!("Quit requested from console");
                    break ConsoleExit::Sentinel;
                }
            }
            Ok(None) => {
                tracing::info!("Console input closed");
                break ConsoleExit::EndOfInput;
            }
            Err(e) => {
                tracing::error!("Console read failed: {}", e);
                break ConsoleExit::ReadError;
            }
        }
    };
    shutdown.cancel();
    exit
}
