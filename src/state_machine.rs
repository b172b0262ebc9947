//! Turn-cycle state machine
//!
//! Implements the Elm Architecture pattern: a pure transition function maps
//! the current exchange state and an event to a new state plus effects. The
//! runtime executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ExchangeContext, ExchangeState};
pub use transition::{transition, TransitionError, TransitionResult};
