//! Transport reader: socket -> inbound queue

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use crate::codec::LineCodec;
use crate::error::{BotError, Result};
use crate::queue::InboundLine;
use crate::session::GenerationId;

/// Forward lines from the server to the dispatcher until an error or cancellation.
///
/// Returns `Ok(())` when cancelled, `Err` on read failure or when the server
/// closes the connection. Never retries.
pub async fn run_reader<R>(
    mut lines: FramedRead<R, LineCodec>,
    generation: GenerationId,
    inbound: mpsc::Sender<InboundLine>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            next = lines.next() => match next {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Err(e),
                None => return Err(BotError::Disconnected),
            },
        };

        if line.is_empty() {
            continue;
        }
        tracing::info!("<< {}", line);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            sent = inbound.send(InboundLine::new(generation, line)) => {
                if sent.is_err() {
                    tracing::debug!("Dispatcher gone, reader exiting");
                    return Ok(());
                }
            }
        }
    }
}
