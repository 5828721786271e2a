//! Message dispatcher
//!
//! Consumes the inbound queue for the whole process lifetime, across
//! reconnects. Lines read by a generation that is no longer active are
//! dropped unseen. Pings and CTCP requests are answered inline, before the
//! next line is looked at. Questions and commands run as spawned tasks behind a
//! bounded admission gate, so a slow handler never stalls classification.
//!
//! ```text
//! inbound ──► Classifier ──► Ping ─────────► PONG ───────────┐
//!                        ├─► OutOfBand ────► NOTICE ─────────┤
//!                        ├─► Question ──┐                    ├──► outbound
//!                        ├─► Command ───┴─► spawn (permit) ──┘
//!                        └─► Unrecognized (dropped)
//! ```

pub mod classify;
pub mod ctcp;
pub mod event;

use std::sync::Arc;

use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::commands::{games, CommandRegistry, Invocation, Services};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::queue::{InboundLine, Outbound};
use crate::session::SessionState;

pub use classify::{Classifier, Matcher, Privmsg};
pub use event::{DispatchEvent, Sender};

/// Routes classified lines to replies and handlers
pub struct Dispatcher {
    config: Arc<SessionConfig>,
    classifier: Arc<Classifier>,
    services: Arc<Services>,
    outbound: Outbound,
    admission: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(services: Arc<Services>, outbound: Outbound) -> Result<Self> {
        let config = services.config.clone();
        let classifier = Classifier::new(&config, services.registry.clone())?;
        let admission = Arc::new(Semaphore::new(config.max_in_flight));
        Ok(Self {
            config,
            classifier: Arc::new(classifier),
            services,
            outbound,
            admission,
        })
    }

    /// Dispatch lines until the inbound queue closes or shutdown is requested.
    ///
    /// `state` is the supervisor's session state; a line is only dispatched
    /// while the generation that read it is still active.
    pub async fn run(
        self,
        mut inbound: mpsc::Receiver<InboundLine>,
        state: watch::Receiver<SessionState>,
        shutdown: CancellationToken,
    ) {
        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = inbound.recv() => match next {
                    Some(line) => line,
                    None => break,
                },
            };
            let current = *state.borrow();
            if current != SessionState::Active(line.generation) {
                tracing::debug!(
                    "Dropping line from {} (session is {}): {}",
                    line.generation,
                    current,
                    line.text
                );
                continue;
            }
            self.dispatch(&line.text);
        }
        tracing::debug!("Dispatcher stopped");
    }

    fn admit(&self, what: &str) -> Option<OwnedSemaphorePermit> {
        match self.admission.clone().try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(
                    "{} handlers already running, dropping {}",
                    self.config.max_in_flight,
                    what
                );
                None
            }
        }
    }

    /// Classify and route one line. Must be called from within the runtime.
    pub fn dispatch(&self, line: &str) -> DispatchEvent {
        let event = self.classifier.classify(line);
        match &event {
            DispatchEvent::Ping { token } => {
                self.outbound.send(format!("PONG {}", token));
            }
            DispatchEvent::OutOfBand {
                sender, kind, args, ..
            } => {
                tracing::debug!("CTCP {} from {}", kind, sender.nick);
                self.outbound
                    .send(ctcp::reply_line(&sender.nick, kind, args, &self.config));
            }
            DispatchEvent::Question { reply_to, .. } => {
                if let Some(permit) = self.admit("question") {
                    let out = self.outbound.clone();
                    let reply_to = reply_to.clone();
                    tokio::spawn(async move {
                        games::yes_no(out, reply_to).await;
                        drop(permit);
                    });
                }
            }
            DispatchEvent::Command {
                sender,
                reply_to,
                name,
                args,
                ..
            } => {
                let spec = self.services.registry.get(name).cloned();
                let admitted = spec.and_then(|spec| {
                    self.admit(&format!("command '{}'", name))
                        .map(|permit| (spec, permit))
                });
                if let Some((spec, permit)) = admitted {
                    let invocation = Invocation {
                        out: self.outbound.clone(),
                        reply_to: reply_to.clone(),
                        nick: sender.nick.clone(),
                        host: sender.host.clone(),
                        args: args.clone(),
                        services: self.services.clone(),
                    };
                    tokio::spawn(async move {
                        CommandRegistry::invoke(spec, invocation).await;
                        drop(permit);
                    });
                }
            }
            DispatchEvent::Unrecognized => {
                tracing::debug!("Unhandled line: {}", line);
            }
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{outbound_queue, OutboundReceiver};
    use crate::session::GenerationId;

    fn dispatcher(max_in_flight: usize) -> (Dispatcher, OutboundReceiver) {
        let config = Arc::new(SessionConfig {
            nick: "bot".to_string(),
            max_in_flight,
            ..SessionConfig::default()
        });
        let registry = Arc::new(CommandRegistry::with_builtins());
        let services = Arc::new(Services::new(config, None, registry));
        let (out, rx) = outbound_queue();
        (Dispatcher::new(services, out).unwrap(), rx)
    }

    #[tokio::test]
    async fn test_ping_answered_before_next_line() {
        let (dispatcher, rx) = dispatcher(4);
        let (tx, inbound) = mpsc::channel(8);
        let (_state_tx, state) = watch::channel(SessionState::Active(GenerationId(0)));
        for text in [
            "PING :one",
            ":alice!~a@host PRIVMSG bot :\x01VERSION\x01",
            "PING :two",
        ] {
            tx.send(InboundLine::new(GenerationId(0), text)).await.unwrap();
        }
        drop(tx);

        dispatcher.run(inbound, state, CancellationToken::new()).await;

        let mut rx = rx.lock().await;
        assert_eq!(rx.recv().await.as_deref(), Some("PONG :one"));
        assert!(rx.recv().await.unwrap().starts_with("NOTICE alice :\x01VERSION ircwarden"));
        assert_eq!(rx.recv().await.as_deref(), Some("PONG :two"));
    }

    #[tokio::test]
    async fn test_lines_from_ended_generation_are_dropped() {
        let (dispatcher, rx) = dispatcher(4);
        let (tx, inbound) = mpsc::channel(8);
        let (_state_tx, state) = watch::channel(SessionState::Active(GenerationId(1)));
        tx.send(InboundLine::new(GenerationId(0), "PING :stale"))
            .await
            .unwrap();
        tx.send(InboundLine::new(GenerationId(1), "PING :fresh"))
            .await
            .unwrap();
        drop(tx);

        dispatcher.run(inbound, state, CancellationToken::new()).await;

        let mut rx = rx.lock().await;
        assert_eq!(rx.recv().await.as_deref(), Some("PONG :fresh"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lines_dropped_while_draining() {
        let (dispatcher, rx) = dispatcher(4);
        let (tx, inbound) = mpsc::channel(8);
        let (_state_tx, state) = watch::channel(SessionState::Draining(GenerationId(0)));
        tx.send(InboundLine::new(GenerationId(0), "PING :late"))
            .await
            .unwrap();
        drop(tx);

        dispatcher.run(inbound, state, CancellationToken::new()).await;
        assert!(rx.lock().await.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_command_spawned_with_channel_target() {
        let (dispatcher, rx) = dispatcher(4);
        let event = dispatcher.dispatch(":alice!~a@host PRIVMSG #room :bot: dice");
        assert_eq!(event.kind(), "command");

        let line = rx.lock().await.recv().await.unwrap();
        let n: u8 = line.strip_prefix("PRIVMSG #room :").unwrap().parse().unwrap();
        assert!((1..=6).contains(&n));
    }

    #[tokio::test]
    async fn test_admission_exhausted_drops_invocation() {
        let (dispatcher, rx) = dispatcher(1);
        let held = dispatcher.admission.clone().try_acquire_owned().unwrap();

        dispatcher.dispatch(":alice!~a@host PRIVMSG #room :bot: coin");
        tokio::task::yield_now().await;
        assert!(rx.lock().await.try_recv().is_err());

        drop(held);
        dispatcher.dispatch(":alice!~a@host PRIVMSG #room :bot: coin");
        let line = rx.lock().await.recv().await.unwrap();
        assert!(line == "PRIVMSG #room :Heads." || line == "PRIVMSG #room :Tails.");
    }

    #[tokio::test]
    async fn test_unrecognized_produces_nothing() {
        let (dispatcher, rx) = dispatcher(4);
        let event = dispatcher.dispatch(":irc.example.org NOTICE * :*** Looking up your hostname");
        assert_eq!(event, DispatchEvent::Unrecognized);
        assert!(rx.lock().await.try_recv().is_err());
    }
}
