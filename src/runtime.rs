//! Runtime for executing the turn cycle
//!
//! One task owns the [`Conversation`](crate::session::Conversation) and the
//! exchange state. Everything else talks to it through a [`RuntimeHandle`]
//! and observes it through [`RuntimeEvent`] snapshots.

mod admin;
mod executor;

#[cfg(test)]
pub mod testing;

pub use admin::{check_health, discover_schema, DiscoveryStatus, HealthStatus};
pub use executor::ConversationRuntime;

use crate::backend::Backend;
use crate::session::{SessionId, Turn};
use crate::state_machine::Event;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

const EVENT_CAPACITY: usize = 32;
const BROADCAST_CAPACITY: usize = 64;

/// Full view of the conversation, published after every change
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
    /// A question is waiting for its answer
    pub awaiting_reply: bool,
}

/// Events published to the presentation layer
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    StateChanged(SessionSnapshot),
    /// Transient message that is not part of the transcript
    Notice { message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Conversation runtime has stopped")]
    Stopped,
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct RuntimeHandle {
    event_tx: mpsc::Sender<Event>,
}

impl RuntimeHandle {
    /// Start a runtime on the current tokio runtime.
    ///
    /// The returned receiver is subscribed before the runtime starts, so it
    /// sees the initial snapshot. The runtime stops once every handle is
    /// dropped.
    pub fn spawn<B: Backend + 'static>(
        backend: Arc<B>,
    ) -> (Self, broadcast::Receiver<RuntimeEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        let (broadcast_tx, broadcast_rx) = broadcast::channel(BROADCAST_CAPACITY);

        let runtime =
            ConversationRuntime::new(backend, event_rx, event_tx.downgrade(), broadcast_tx);
        tokio::spawn(runtime.run());

        (Self { event_tx }, broadcast_rx)
    }

    /// Submit a question. Blank input is ignored by the runtime.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.send(Event::user_submit(text)).await
    }

    /// Start a new session, discarding the transcript.
    pub async fn new_session(&self) -> Result<(), RuntimeError> {
        self.send(Event::NewSession {
            session_id: SessionId::generate(),
        })
        .await
    }

    async fn send(&self, event: Event) -> Result<(), RuntimeError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }
}
