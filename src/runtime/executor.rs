//! Conversation runtime executor

use super::{RuntimeEvent, SessionSnapshot};
use crate::backend::{Backend, QueryRequest};
use crate::session::{Conversation, SessionId};
use crate::state_machine::{
    transition, Effect, Event, ExchangeContext, ExchangeState, TransitionError,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Owns the conversation and applies events to it one at a time
pub struct ConversationRuntime<B>
where
    B: Backend + 'static,
{
    conversation: Conversation,
    state: ExchangeState,
    backend: Arc<B>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so that background queries do not keep the runtime alive
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<RuntimeEvent>,
}

impl<B> ConversationRuntime<B>
where
    B: Backend + 'static,
{
    pub fn new(
        backend: Arc<B>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        broadcast_tx: broadcast::Sender<RuntimeEvent>,
    ) -> Self {
        let mut conversation = Conversation::new();
        conversation.initialize();

        Self {
            conversation,
            state: ExchangeState::Idle,
            backend,
            event_rx,
            event_tx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        let context = self.context();
        tracing::info!(
            backend = %self.backend.base_url(),
            session_id = %context.session_id,
            "Starting conversation runtime"
        );
        self.publish_snapshot();

        // Process events in a loop until every handle is gone
        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        tracing::info!("Conversation runtime stopped");
    }

    fn context(&mut self) -> ExchangeContext {
        ExchangeContext::new(self.conversation.initialize().id().clone())
    }

    fn process_event(&mut self, event: Event) {
        let context = self.context();

        // Pure state transition
        let result = match transition(&self.state, &context, event) {
            Ok(r) => r,
            Err(TransitionError::StaleReply { session_id }) => {
                tracing::info!(
                    stale = %session_id,
                    current = %context.session_id,
                    "Discarding reply for a previous session"
                );
                return;
            }
            Err(e @ TransitionError::Busy) => {
                tracing::debug!(state = self.state.name(), "Rejected submission");
                let _ = self.broadcast_tx.send(RuntimeEvent::Notice {
                    message: e.to_string(),
                });
                return;
            }
        };

        if result.new_state != self.state {
            tracing::debug!(
                from = self.state.name(),
                to = result.new_state.name(),
                "Exchange state changed"
            );
        }
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendUserTurn { text } => {
                if let Err(e) = self.conversation.append_user_turn(text) {
                    tracing::error!(error = %e, "Failed to append user turn");
                }
            }

            Effect::AppendAssistantTurn { reply } => {
                if let Err(e) = self.conversation.append_assistant_turn(reply) {
                    tracing::error!(error = %e, "Failed to append assistant turn");
                }
            }

            Effect::ResetSession { session_id } => {
                self.conversation.reset(session_id);
            }

            Effect::SendQuery { session_id, query } => {
                self.spawn_query(session_id, query);
            }

            Effect::NotifyStateChange => self.publish_snapshot(),
        }
    }

    /// Run the backend call in the background and feed the reply back in
    fn spawn_query(&self, session_id: SessionId, query: String) {
        let backend = self.backend.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            tracing::info!(session_id = %session_id, "Sending query (background)");
            let request = QueryRequest {
                query,
                session_id: session_id.as_str().to_string(),
            };
            let outcome = backend.query(&request).await;

            let Some(event_tx) = event_tx.upgrade() else {
                tracing::debug!("Runtime gone, dropping backend reply");
                return;
            };
            let _ = event_tx
                .send(Event::BackendReply {
                    session_id,
                    outcome,
                })
                .await;
        });
    }

    fn publish_snapshot(&self) {
        let Some(session) = self.conversation.session() else {
            return;
        };
        let snapshot = SessionSnapshot {
            session_id: session.id().clone(),
            started_at: session.started_at(),
            turns: self.conversation.transcript().to_vec(),
            awaiting_reply: self.state.is_busy(),
        };
        // No subscribers is fine
        let _ = self.broadcast_tx.send(RuntimeEvent::StateChanged(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{DelayedMockBackend, MockBackend};
    use super::super::{RuntimeEvent, RuntimeHandle, SessionSnapshot};
    use crate::backend::{ApiError, QueryResponse};
    use crate::session::{AssistantReply, Turn};
    use crate::state_machine::transition::NO_RESULTS_SUMMARY;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::broadcast;

    async fn next_event(rx: &mut broadcast::Receiver<RuntimeEvent>) -> RuntimeEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for runtime event")
            .expect("runtime event channel closed")
    }

    async fn next_snapshot(rx: &mut broadcast::Receiver<RuntimeEvent>) -> SessionSnapshot {
        match next_event(rx).await {
            RuntimeEvent::StateChanged(snapshot) => snapshot,
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    fn users_response() -> QueryResponse {
        serde_json::from_value(json!({
            "sql_query": "SELECT COUNT(*) FROM users",
            "results": [{"count": 42}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_full_exchange() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_response(users_response());
        let (handle, mut rx) = RuntimeHandle::spawn(backend.clone());

        let initial = next_snapshot(&mut rx).await;
        assert!(initial.turns.is_empty());
        assert!(!initial.awaiting_reply);

        handle.submit("how many users?").await.unwrap();

        let pending = next_snapshot(&mut rx).await;
        assert_eq!(pending.turns.len(), 1);
        assert!(pending.awaiting_reply);

        let done = next_snapshot(&mut rx).await;
        assert!(!done.awaiting_reply);
        assert_eq!(done.session_id, initial.session_id);
        assert_eq!(
            done.turns[0],
            Turn::User {
                text: "how many users?".to_string()
            }
        );
        let Turn::Assistant {
            reply: AssistantReply::Answer(answer),
        } = &done.turns[1]
        else {
            panic!("expected structured answer, got {:?}", done.turns[1]);
        };
        assert_eq!(answer.summary, "I found 1 results.");
        assert_eq!(answer.rows, users_response().results);
        assert_eq!(done.turns.len(), 2);

        let requests = backend.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "how many users?");
        assert_eq!(requests[0].session_id, initial.session_id.as_str());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = Arc::new(MockBackend::new());
        backend.queue_response(QueryResponse {
            sql_query: Some("SELECT * FROM t".to_string()),
            results: vec![],
        });
        let (handle, mut rx) = RuntimeHandle::spawn(backend.clone());
        next_snapshot(&mut rx).await;

        handle.submit("   ").await.unwrap();
        handle.submit("\t\n").await.unwrap();
        handle.submit("anything?").await.unwrap();

        // The first change observed is the real question
        let pending = next_snapshot(&mut rx).await;
        assert_eq!(
            pending.turns,
            vec![Turn::User {
                text: "anything?".to_string()
            }]
        );

        let done = next_snapshot(&mut rx).await;
        let Turn::Assistant {
            reply: AssistantReply::Answer(answer),
        } = &done.turns[1]
        else {
            panic!("expected structured answer");
        };
        assert_eq!(answer.summary, NO_RESULTS_SUMMARY);
        assert_eq!(backend.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let backend = Arc::new(MockBackend::new());
        let error = ApiError::connection("http://127.0.0.1:5000");
        backend.queue_error(error.clone());
        let (handle, mut rx) = RuntimeHandle::spawn(backend);
        next_snapshot(&mut rx).await;

        handle.submit("how many users?").await.unwrap();
        next_snapshot(&mut rx).await;
        let done = next_snapshot(&mut rx).await;

        assert_eq!(done.turns.len(), 2);
        assert_eq!(
            done.turns[1],
            Turn::Assistant {
                reply: AssistantReply::text(error.message)
            }
        );
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_rejected() {
        let backend = Arc::new(DelayedMockBackend::new(Duration::from_millis(300)));
        backend.queue_response(users_response());
        let (handle, mut rx) = RuntimeHandle::spawn(backend.clone());
        next_snapshot(&mut rx).await;

        handle.submit("first").await.unwrap();
        handle.submit("second").await.unwrap();

        let pending = next_snapshot(&mut rx).await;
        assert_eq!(pending.turns.len(), 1);

        match next_event(&mut rx).await {
            RuntimeEvent::Notice { message } => assert!(message.contains("waiting")),
            other => panic!("expected busy notice, got {other:?}"),
        }

        let done = next_snapshot(&mut rx).await;
        assert_eq!(done.turns.len(), 2);
        assert_eq!(
            done.turns[0],
            Turn::User {
                text: "first".to_string()
            }
        );
        assert_eq!(backend.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_reply() {
        let backend = Arc::new(DelayedMockBackend::new(Duration::from_millis(200)));
        // The old question is answered first, with rows the new one never sees
        let stale: QueryResponse = serde_json::from_value(json!({
            "sql_query": "SELECT name FROM archived_users",
            "results": [{"name": "ada"}, {"name": "grace"}]
        }))
        .unwrap();
        backend.queue_response(stale.clone());
        backend.queue_response(users_response());
        let (handle, mut rx) = RuntimeHandle::spawn(backend.clone());
        let initial = next_snapshot(&mut rx).await;

        handle.submit("old question").await.unwrap();
        assert_eq!(next_snapshot(&mut rx).await.turns.len(), 1);

        handle.new_session().await.unwrap();
        let fresh = next_snapshot(&mut rx).await;
        assert!(fresh.turns.is_empty());
        assert!(!fresh.awaiting_reply);
        assert_ne!(fresh.session_id, initial.session_id);

        handle.submit("new question").await.unwrap();
        assert_eq!(next_snapshot(&mut rx).await.turns.len(), 1);

        // Every snapshot until the new answer must be free of the old rows
        let done = loop {
            let snapshot = next_snapshot(&mut rx).await;
            let has_stale_rows = snapshot.turns.iter().any(|turn| {
                matches!(
                    turn,
                    Turn::Assistant { reply: AssistantReply::Answer(answer) }
                        if answer.rows == stale.results
                )
            });
            assert!(!has_stale_rows, "old reply leaked: {:?}", snapshot.turns);
            if !snapshot.awaiting_reply {
                break snapshot;
            }
        };

        assert_eq!(done.session_id, fresh.session_id);
        assert_eq!(done.turns.len(), 2);
        assert_eq!(
            done.turns[0],
            Turn::User {
                text: "new question".to_string()
            }
        );
        let Turn::Assistant {
            reply: AssistantReply::Answer(answer),
        } = &done.turns[1]
        else {
            panic!("expected structured answer, got {:?}", done.turns[1]);
        };
        assert_eq!(answer.rows, users_response().results);
        assert_eq!(answer.query.as_deref(), Some("SELECT COUNT(*) FROM users"));

        let requests = backend.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].session_id, initial.session_id.as_str());
        assert_eq!(requests[1].session_id, fresh.session_id.as_str());
    }

    #[tokio::test]
    async fn test_runtime_stops_when_handles_dropped() {
        let backend = Arc::new(MockBackend::new());
        let (handle, mut rx) = RuntimeHandle::spawn(backend);
        next_snapshot(&mut rx).await;

        drop(handle);
        let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("runtime did not stop");
        assert!(matches!(closed, Err(broadcast::error::RecvError::Closed)));
    }
}
