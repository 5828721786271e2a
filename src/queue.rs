//! Handoff queues between the session workers
//!
//! - Outbound: many producers (console, dispatcher, handlers), one consumer
//!   (the active generation's writer). Unbounded, FIFO.
//! - Inbound: transport reader -> dispatcher. Bounded, FIFO. Each line is
//!   tagged with the generation that read it.
//!
//! The outbound receiver outlives every generation. It sits behind an async
//! mutex that the writer holds for its whole lifetime, so at most one writer
//! can drain it at a time.

use std::borrow::Cow;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::session::GenerationId;

/// Capacity of the inbound queue
pub const INBOUND_CAPACITY: usize = 256;

/// Producer handle for lines bound for the server
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<String>,
}

/// Consumer side of the outbound queue, shared across generations
pub type OutboundReceiver = Arc<Mutex<mpsc::UnboundedReceiver<String>>>;

/// Create the process-wide outbound queue
pub fn outbound_queue() -> (Outbound, OutboundReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Outbound { tx }, Arc::new(Mutex::new(rx)))
}

/// A line read from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundLine {
    /// Generation whose reader received the line
    pub generation: GenerationId,
    pub text: String,
}

impl InboundLine {
    pub fn new(generation: GenerationId, text: impl Into<String>) -> Self {
        Self {
            generation,
            text: text.into(),
        }
    }
}

/// Create the inbound queue
pub fn inbound_queue() -> (mpsc::Sender<InboundLine>, mpsc::Receiver<InboundLine>) {
    mpsc::channel(INBOUND_CAPACITY)
}

impl Outbound {
    /// Enqueue a raw protocol line. Returns false once the queue is closed.
    pub fn send(&self, line: impl Into<String>) -> bool {
        self.tx.send(line.into()).is_ok()
    }

    /// Enqueue `PRIVMSG <target> :<text>`
    pub fn privmsg(&self, target: &str, text: &str) -> bool {
        self.send(format!("PRIVMSG {} :{}", target, text))
    }

    /// Enqueue `NOTICE <target> :<text>`
    pub fn notice(&self, target: &str, text: &str) -> bool {
        self.send(format!("NOTICE {} :{}", target, text))
    }
}

/// Mask credentials before a line is written to the log
pub fn redact(line: &str) -> Cow<'_, str> {
    const IDENTIFY: &str = "PRIVMSG NICKSERV :IDENTIFY ";
    let is_identify = line
        .get(..IDENTIFY.len())
        .map(|head| head.eq_ignore_ascii_case(IDENTIFY))
        .unwrap_or(false);
    if is_identify {
        Cow::Owned(format!("{}********", &line[..IDENTIFY.len()]))
    } else {
        Cow::Borrowed(line)
    }
}
