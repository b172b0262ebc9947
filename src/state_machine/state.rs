//! Exchange state types

use crate::session::SessionId;

/// Where the current question/answer exchange stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExchangeState {
    /// Ready for the next question
    #[default]
    Idle,
    /// A query for `session_id` is in flight
    AwaitingBackend { session_id: SessionId },
}

impl ExchangeState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ExchangeState::AwaitingBackend { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExchangeState::Idle => "idle",
            ExchangeState::AwaitingBackend { .. } => "awaiting_backend",
        }
    }
}

/// Read-only facts the transition function needs
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    /// Id of the active session
    pub session_id: SessionId,
}

impl ExchangeContext {
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}
