//! Property-based tests for the exchange state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::{NO_QUERY_SUMMARY, NO_RESULTS_SUMMARY};
use super::*;
use crate::backend::{ApiError, ApiErrorKind, QueryResponse, Row};
use crate::session::{AssistantReply, SessionId};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ExchangeContext {
    ExchangeContext::new(SessionId::generate())
}

fn answer_of(result: &TransitionResult) -> Option<&crate::session::QueryAnswer> {
    result.effects.iter().find_map(|effect| match effect {
        Effect::AppendAssistantTurn {
            reply: AssistantReply::Answer(answer),
        } => Some(answer),
        _ => None,
    })
}

fn reply(ctx: &ExchangeContext, response: QueryResponse) -> TransitionResult {
    let state = ExchangeState::AwaitingBackend {
        session_id: ctx.session_id.clone(),
    };
    transition(
        &state,
        ctx,
        Event::BackendReply {
            session_id: ctx.session_id.clone(),
            outcome: Ok(response),
        },
    )
    .unwrap()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state(ctx: &ExchangeContext) -> impl Strategy<Value = ExchangeState> {
    prop_oneof![
        Just(ExchangeState::Idle),
        Just(ExchangeState::AwaitingBackend {
            session_id: ctx.session_id.clone()
        }),
    ]
}

fn arb_row() -> impl Strategy<Value = Row> {
    ("[a-z]{1,8}", any::<i32>()).prop_map(|(name, n)| {
        let mut row = Row::new();
        row.insert("name".to_string(), json!(name));
        row.insert("n".to_string(), json!(n));
        row
    })
}

/// SQL text that contains SELECT in some casing
fn arb_select_sql() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("SELECT"), Just("select"), Just("SeLeCt")],
        "[a-z *,]{0,20}",
    )
        .prop_map(|(kw, rest)| format!("{kw} {rest}"))
}

fn arb_error_kind() -> impl Strategy<Value = ApiErrorKind> {
    prop_oneof![
        (400u16..600).prop_map(|status| ApiErrorKind::Http { status }),
        Just(ApiErrorKind::Connection),
        Just(ApiErrorKind::Timeout),
        Just(ApiErrorKind::Unexpected),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_empty_select_result_says_no_results(sql in arb_select_sql()) {
        let ctx = test_context();
        let result = reply(&ctx, QueryResponse { sql_query: Some(sql), results: vec![] });
        let answer = answer_of(&result).unwrap();
        prop_assert_eq!(answer.summary.as_str(), NO_RESULTS_SUMMARY);
        prop_assert_eq!(answer.row_count, 0);
    }

    #[test]
    fn prop_missing_sql_says_unable(rows in proptest::collection::vec(arb_row(), 0..10)) {
        let ctx = test_context();
        let result = reply(&ctx, QueryResponse { sql_query: None, results: rows });
        let answer = answer_of(&result).unwrap();
        prop_assert_eq!(answer.summary.as_str(), NO_QUERY_SUMMARY);
    }

    #[test]
    fn prop_row_count_in_summary(
        sql in arb_select_sql(),
        rows in proptest::collection::vec(arb_row(), 1..30),
    ) {
        let ctx = test_context();
        let n = rows.len();
        let result = reply(&ctx, QueryResponse { sql_query: Some(sql), results: rows.clone() });
        let answer = answer_of(&result).unwrap();
        prop_assert_eq!(answer.summary.clone(), format!("I found {n} results."));
        prop_assert_eq!(answer.row_count, n);
        prop_assert_eq!(&answer.rows, &rows);
    }

    #[test]
    fn prop_blank_input_never_has_effects(text in "[ \t\r\n]{0,10}") {
        let ctx = test_context();
        let awaiting = ExchangeState::AwaitingBackend { session_id: ctx.session_id.clone() };
        for state in [ExchangeState::Idle, awaiting] {
            let result = transition(&state, &ctx, Event::user_submit(text.clone())).unwrap();
            prop_assert!(result.effects.is_empty());
            prop_assert_eq!(result.new_state, state);
        }
    }

    #[test]
    fn prop_submit_carries_session_id(text in "[a-zA-Z?]{1,30}") {
        let ctx = test_context();
        let result =
            transition(&ExchangeState::Idle, &ctx, Event::user_submit(text.clone())).unwrap();
        let sent = result.effects.iter().find_map(|effect| match effect {
            Effect::SendQuery { session_id, query } => Some((session_id.clone(), query.clone())),
            _ => None,
        });
        let (session_id, query) = sent.unwrap();
        prop_assert_eq!(query, text);
        prop_assert_eq!(session_id, ctx.session_id);
        prop_assert!(result.new_state.is_busy());
    }

    #[test]
    fn prop_errors_become_text_turns(kind in arb_error_kind(), message in "[a-zA-Z :]{1,40}") {
        let ctx = test_context();
        let state = ExchangeState::AwaitingBackend { session_id: ctx.session_id.clone() };
        let result = transition(&state, &ctx, Event::BackendReply {
            session_id: ctx.session_id.clone(),
            outcome: Err(ApiError::new(kind, message.clone())),
        }).unwrap();
        prop_assert_eq!(result.new_state, ExchangeState::Idle);
        prop_assert_eq!(&result.effects[0], &Effect::AppendAssistantTurn {
            reply: AssistantReply::text(message),
        });
    }

    #[test]
    fn prop_reset_always_returns_to_idle(state in arb_state(&test_context())) {
        let ctx = test_context();
        let reset = Event::NewSession { session_id: SessionId::generate() };
        let result = transition(&state, &ctx, reset).unwrap();
        prop_assert_eq!(result.new_state, ExchangeState::Idle);
        let has_reset = result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::ResetSession { .. }));
        prop_assert!(has_reset);
    }

    #[test]
    fn prop_foreign_replies_never_append(state in arb_state(&test_context())) {
        let ctx = test_context();
        let foreign = SessionId::generate();
        let result = transition(&state, &ctx, Event::BackendReply {
            session_id: foreign,
            outcome: Ok(QueryResponse::default()),
        });
        let is_stale = matches!(result, Err(TransitionError::StaleReply { .. }));
        prop_assert!(is_stale);
    }
}
