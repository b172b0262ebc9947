//! Events that drive the exchange state machine

use crate::backend::{ApiError, QueryResponse};
use crate::session::SessionId;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserSubmit {
        text: String,
    },
    NewSession {
        session_id: SessionId,
    },

    // Backend events
    BackendReply {
        /// Session the query was sent under
        session_id: SessionId,
        outcome: Result<QueryResponse, ApiError>,
    },
}

impl Event {
    pub fn user_submit(text: impl Into<String>) -> Self {
        Event::UserSubmit { text: text.into() }
    }
}
