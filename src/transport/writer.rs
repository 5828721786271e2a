//! Transport writer: outbound queue -> socket

use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;

use crate::codec::LineCodec;
use crate::error::Result;
use crate::queue::{redact, OutboundReceiver};

/// Drain the outbound queue to the server, one write-and-flush per line.
///
/// Lines already waiting in the queue win over cancellation, so a `QUIT`
/// enqueued just before shutdown still reaches the server.
pub async fn run_writer<W>(
    mut sink: FramedWrite<W, LineCodec>,
    outbound: OutboundReceiver,
    cancel: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    // Held for the whole generation: this writer is the queue's only consumer
    let mut queue = outbound.lock_owned().await;

    loop {
        let line = tokio::select! {
            biased;
            next = queue.recv() => match next {
                Some(line) => line,
                None => return Ok(()),
            },
            _ = cancel.cancelled() => return Ok(()),
        };

        let logged = redact(&line).into_owned();
        tracing::info!(">> {}", logged);

        tokio::select! {
            biased;
            sent = sink.send(line) => sent?,
            _ = cancel.cancelled() => {
                tracing::warn!("Write cancelled, line not sent: {}", logged);
                return Ok(());
            }
        }
    }
}
