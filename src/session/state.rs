//! Session lifecycle states

use std::fmt;

/// Identifier of one connect attempt. Strictly increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GenerationId(pub u64);

impl GenerationId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The very first attempt skips the reconnect backoff
    pub fn is_first(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Supervisor state machine
///
/// ```text
/// Idle → Connecting → Handshaking → Active → Draining ─┐
///  ▲                                                    │
///  └────────────────────────────────────────────────────┤
///                                            Terminated ◄┘ (shutdown requested)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting(GenerationId),
    Handshaking(GenerationId),
    Active(GenerationId),
    Draining(GenerationId),
    Terminated,
}

impl SessionState {
    pub fn generation(&self) -> Option<GenerationId> {
        match self {
            Self::Connecting(g) | Self::Handshaking(g) | Self::Active(g) | Self::Draining(g) => {
                Some(*g)
            }
            Self::Idle | Self::Terminated => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting(g) => write!(f, "connecting ({})", g),
            Self::Handshaking(g) => write!(f, "handshaking ({})", g),
            Self::Active(g) => write!(f, "active ({})", g),
            Self::Draining(g) => write!(f, "draining ({})", g),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}
