//! Conversation session and transcript
//!
//! A conversation is either `Empty` (no session yet) or holds an active
//! [`Session`]: an id plus the append-only transcript of turns.

use crate::backend::Row;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Opaque, never-empty session identifier sent with every query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(format!("session-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A structured answer to a question
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnswer {
    pub summary: String,
    pub query: Option<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
}

/// Assistant turn content
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantReply {
    /// Status or error text
    Text { text: String },
    Answer(QueryAnswer),
}

impl AssistantReply {
    pub fn text(text: impl Into<String>) -> Self {
        AssistantReply::Text { text: text.into() }
    }
}

/// One message in the transcript
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User { text: String },
    Assistant { reply: AssistantReply },
}

impl Turn {
    pub fn role(&self) -> Role {
        match self {
            Turn::User { .. } => Role::User,
            Turn::Assistant { .. } => Role::Assistant,
        }
    }
}

/// An active conversation
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    transcript: Vec<Turn>,
    started_at: DateTime<Utc>,
}

impl Session {
    fn start(id: SessionId) -> Self {
        Self {
            id,
            transcript: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Turns in chronological order
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No active session")]
    NotActive,
}

/// Session lifecycle: `Empty` until initialized, `Active` afterwards
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    session: Option<Session>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session if none exists. An active session is kept as is.
    pub fn initialize(&mut self) -> &Session {
        self.session.get_or_insert_with(|| {
            let session = Session::start(SessionId::generate());
            tracing::info!(session_id = %session.id, "Session started");
            session
        })
    }

    /// Drop the transcript and start over under `id`.
    ///
    /// The new id always differs from the one it replaces.
    pub fn reset(&mut self, id: SessionId) -> &Session {
        let previous = self.session.as_ref().map(|s| s.id.clone());
        // A collision would make the reset invisible to the backend
        let id = if previous.as_ref() == Some(&id) {
            SessionId::generate()
        } else {
            id
        };
        let session = Session::start(id);
        tracing::info!(
            previous = ?previous.as_ref().map(SessionId::as_str),
            session_id = %session.id,
            "Session reset"
        );
        self.session.insert(session)
    }

    pub fn append_user_turn(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.push(Turn::User { text: text.into() })
    }

    pub fn append_assistant_turn(&mut self, reply: AssistantReply) -> Result<(), SessionError> {
        self.push(Turn::Assistant { reply })
    }

    fn push(&mut self, turn: Turn) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotActive)?;
        session.transcript.push(turn);
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Turns of the active session; empty while `Empty`
    pub fn transcript(&self) -> &[Turn] {
        match &self.session {
            Some(session) => session.transcript(),
            None => &[],
        }
    }
}
