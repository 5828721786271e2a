//! Session supervisor: connect, register, run, drain, back off, repeat

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;

use crate::codec::LineCodec;
use crate::config::SessionConfig;
use crate::error::{BotError, Result};
use crate::queue::{InboundLine, OutboundReceiver};
use crate::transport::Connector;

use super::generation::{Generation, Worker};
use super::handshake;
use super::state::{GenerationId, SessionState};

/// Summary returned when the supervisor terminates cleanly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Number of generations that reached a connected transport
    pub generations: u64,
}

/// Owns the connection lifecycle.
///
/// The outbound receiver and the inbound sender outlive every generation;
/// each generation borrows them for its reader and writer. Only one
/// generation exists at a time.
pub struct Supervisor<C: Connector> {
    config: Arc<SessionConfig>,
    connector: C,
    outbound: OutboundReceiver,
    inbound: mpsc::Sender<InboundLine>,
    shutdown: CancellationToken,
    state: watch::Sender<SessionState>,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(
        config: Arc<SessionConfig>,
        connector: C,
        outbound: OutboundReceiver,
        inbound: mpsc::Sender<InboundLine>,
        shutdown: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            config,
            connector,
            outbound,
            inbound,
            shutdown,
            state,
        }
    }

    /// Publish state transitions on an existing channel instead
    pub fn with_state_sender(mut self, state: watch::Sender<SessionState>) -> Self {
        state.send_replace(*self.state.borrow());
        self.state = state;
        self
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SessionState) {
        tracing::debug!("Session state: {}", next);
        self.state.send_replace(next);
    }

    fn terminate(&self, error: BotError) -> BotError {
        self.transition(SessionState::Terminated);
        error
    }

    /// Run until global shutdown, or until no transport can be established.
    ///
    /// Connection failure is fatal and returned as `Err`. A transient failure
    /// after the connection is up (see [`BotError::is_transient`]) only ends
    /// the generation; anything else terminates the session.
    pub async fn run(self) -> Result<SessionReport> {
        let delay = self.config.reconnect_delay();
        let mut report = SessionReport::default();
        let mut id = GenerationId::default();

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            if id.is_first() {
                tracing::info!("Starting session with {}", self.config.endpoint());
            } else {
                tracing::info!("Reconnecting in {}s...", delay.as_secs());
                tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            self.transition(SessionState::Connecting(id));
            let connected = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                connected = self.connector.connect() => connected,
            };
            let connection = match connected {
                Ok(connection) => connection,
                Err(e) => {
                    tracing::error!("{}: no transport could be established: {}", id, e);
                    return Err(self.terminate(e));
                }
            };
            report.generations += 1;
            tracing::info!(
                "{}: connected ({})",
                id,
                if connection.secure { "tls" } else { "plaintext" }
            );

            let (read_half, write_half) = tokio::io::split(connection.stream);
            let reader = FramedRead::new(read_half, LineCodec::new());
            let mut writer = FramedWrite::new(write_half, LineCodec::new());

            self.transition(SessionState::Handshaking(id));
            if let Err(e) = handshake::register(&mut writer, &self.config).await {
                tracing::warn!("{}: registration failed: {}", id, e);
                self.transition(SessionState::Draining(id));
                drop(reader);
                drop(writer);
                if !e.is_transient() {
                    return Err(self.terminate(e));
                }
                self.transition(SessionState::Idle);
                id = id.next();
                continue;
            }

            self.transition(SessionState::Active(id));
            let mut generation = Generation::spawn(
                id,
                &self.shutdown,
                reader,
                writer,
                self.outbound.clone(),
                self.inbound.clone(),
            );

            let first = generation.wait_first().await;
            let worker = match first.worker {
                Some(Worker::Reader) => "reader",
                Some(Worker::Writer) => "writer",
                None => "worker",
            };
            match &first.result {
                Err(e) => tracing::warn!("{}: {} failed: {}", id, worker, e),
                Ok(()) => tracing::info!("{}: {} stopped", id, worker),
            }

            self.transition(SessionState::Draining(id));
            for exit in generation.drain().await {
                if let Err(e) = exit.result {
                    tracing::debug!("{}: worker exited with {}", id, e);
                }
            }
            if let Err(e) = first.result {
                if !e.is_transient() {
                    return Err(self.terminate(e));
                }
            }
            self.transition(SessionState::Idle);
            id = id.next();
        }

        tracing::info!("Session terminated after {} generation(s)", report.generations);
        self.transition(SessionState::Terminated);
        Ok(report)
    }
}
