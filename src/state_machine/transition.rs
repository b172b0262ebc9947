//! Pure state transition function

use super::{Effect, Event, ExchangeContext, ExchangeState};
use crate::backend::QueryResponse;
use crate::session::{AssistantReply, QueryAnswer, SessionId};
use thiserror::Error;

pub const NO_QUERY_SUMMARY: &str = "unable to generate a query for your request";
pub const NO_RESULTS_SUMMARY: &str = "query ran successfully but returned no results";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ExchangeState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ExchangeState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Still waiting for the previous answer, try again in a moment")]
    Busy,
    #[error("Discarding reply for stale session {session_id}")]
    StaleReply { session_id: SessionId },
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// expressed as effects.
pub fn transition(
    state: &ExchangeState,
    context: &ExchangeContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Blank input is dropped without a trace
        (_, Event::UserSubmit { text }) if text.trim().is_empty() => {
            Ok(TransitionResult::new(state.clone()))
        }

        // Idle + UserSubmit -> AwaitingBackend
        (ExchangeState::Idle, Event::UserSubmit { text }) => {
            let send = Effect::send_query(&text, &context.session_id);
            Ok(TransitionResult::new(ExchangeState::AwaitingBackend {
                session_id: context.session_id.clone(),
            })
            .with_effect(Effect::AppendUserTurn { text })
            .with_effect(Effect::NotifyStateChange)
            .with_effect(send))
        }

        // One exchange at a time
        (ExchangeState::AwaitingBackend { .. }, Event::UserSubmit { .. }) => {
            Err(TransitionError::Busy)
        }

        // Reset is always allowed; a reply still in flight becomes stale
        (_, Event::NewSession { session_id }) => Ok(TransitionResult::new(ExchangeState::Idle)
            .with_effects([
                Effect::ResetSession { session_id },
                Effect::NotifyStateChange,
            ])),

        (
            ExchangeState::AwaitingBackend {
                session_id: awaited,
            },
            Event::BackendReply {
                session_id,
                outcome,
            },
        ) if *awaited == session_id && context.session_id == session_id => {
            let reply = match outcome {
                Ok(response) => AssistantReply::Answer(summarize(response)),
                Err(e) => AssistantReply::text(e.message),
            };
            Ok(TransitionResult::new(ExchangeState::Idle)
                .with_effect(Effect::AppendAssistantTurn { reply })
                .with_effect(Effect::NotifyStateChange))
        }

        (_, Event::BackendReply { session_id, .. }) => {
            Err(TransitionError::StaleReply { session_id })
        }
    }
}

/// Turn a backend reply into the answer shown to the user.
pub fn summarize(response: QueryResponse) -> QueryAnswer {
    let row_count = response.results.len();
    let query = response.sql().map(str::to_string);
    let summary = match &query {
        None => NO_QUERY_SUMMARY.to_string(),
        Some(sql) if row_count == 0 && sql.to_uppercase().contains("SELECT") => {
            NO_RESULTS_SUMMARY.to_string()
        }
        Some(_) => format!("I found {row_count} results."),
    };

    QueryAnswer {
        summary,
        query,
        rows: response.results,
        row_count,
    }
}
