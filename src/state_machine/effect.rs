//! Effects produced by state transitions

use crate::session::{AssistantReply, SessionId};

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append the user's question to the transcript
    AppendUserTurn { text: String },

    /// Append the backend's answer (or the error text) to the transcript
    AppendAssistantTurn { reply: AssistantReply },

    /// Discard the transcript and continue under a new id
    ResetSession { session_id: SessionId },

    /// Send a question to the backend (runs as a background task)
    SendQuery { session_id: SessionId, query: String },

    /// Publish a full snapshot to the presentation layer
    NotifyStateChange,
}

impl Effect {
    pub fn send_query(query: &str, session_id: &SessionId) -> Self {
        Effect::SendQuery {
            session_id: session_id.clone(),
            query: query.to_string(),
        }
    }
}
