//! Session lifecycle
//!
//! The [`Supervisor`] drives one logical session through successive
//! connection generations:
//!
//! ```text
//!   ┌──────────── backoff (skipped on first attempt) ◄────────────┐
//!   ▼                                                              │
//! Connecting ─► Handshaking ─► Active ─► Draining ─► Idle ─────────┘
//!      │                        (reader/writer)        │
//!      └── no transport: fatal                         └── shutdown: Terminated
//! ```

pub mod generation;
pub mod handshake;
pub mod state;
pub mod supervisor;

pub use generation::{Generation, Worker, WorkerExit};
pub use state::{GenerationId, SessionState};
pub use supervisor::{SessionReport, Supervisor};
