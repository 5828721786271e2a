//! One connection generation: a socket, its two workers, one cancellation scope

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;

use crate::codec::LineCodec;
use crate::error::{BotError, Result};
use crate::queue::{InboundLine, OutboundReceiver};
use crate::transport::{run_reader, run_writer};

use super::state::GenerationId;

/// Which worker of a generation finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Worker {
    Reader,
    Writer,
}

/// Completion report from a worker
#[derive(Debug)]
pub struct WorkerExit {
    pub worker: Option<Worker>,
    pub result: Result<()>,
}

/// Tasks of one generation, all sharing one cancellation token.
///
/// The token is a child of the process-wide shutdown token, so a global
/// shutdown cancels the generation while a worker failure cancels only
/// the generation.
pub struct Generation {
    pub id: GenerationId,
    token: CancellationToken,
    tasks: JoinSet<WorkerExit>,
}

impl Generation {
    /// Spawn the reader and writer for a freshly registered connection
    pub fn spawn<R, W>(
        id: GenerationId,
        shutdown: &CancellationToken,
        reader: FramedRead<R, LineCodec>,
        writer: FramedWrite<W, LineCodec>,
        outbound: OutboundReceiver,
        inbound: mpsc::Sender<InboundLine>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let token = shutdown.child_token();
        let mut tasks = JoinSet::new();

        let reader_token = token.clone();
        tasks.spawn(async move {
            WorkerExit {
                worker: Some(Worker::Reader),
                result: run_reader(reader, id, inbound, reader_token).await,
            }
        });

        let writer_token = token.clone();
        tasks.spawn(async move {
            WorkerExit {
                worker: Some(Worker::Writer),
                result: run_writer(writer, outbound, writer_token).await,
            }
        });

        tracing::debug!("{}: reader and writer spawned", id);
        Self { id, token, tasks }
    }

    /// Wait for the first worker to finish (error, disconnect, or cancellation)
    pub async fn wait_first(&mut self) -> WorkerExit {
        match self.tasks.join_next().await {
            Some(joined) => flatten(joined),
            None => WorkerExit {
                worker: None,
                result: Ok(()),
            },
        }
    }

    /// Cancel every remaining task and wait until all of them have exited
    pub async fn drain(mut self) -> Vec<WorkerExit> {
        self.token.cancel();
        let mut exits = Vec::new();
        while let Some(joined) = self.tasks.join_next().await {
            exits.push(flatten(joined));
        }
        tracing::debug!("{}: all workers stopped", self.id);
        exits
    }
}

fn flatten(joined: std::result::Result<WorkerExit, tokio::task::JoinError>) -> WorkerExit {
    match joined {
        Ok(exit) => exit,
        Err(e) => WorkerExit {
            worker: None,
            result: Err(BotError::Transport {
                message: format!("Worker task failed: {}", e),
            }),
        },
    }
}
