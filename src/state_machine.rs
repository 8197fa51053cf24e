//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Divination, Effect};
pub use event::{Command, Event};
pub use state::ConvState;
pub use transition::{transition, TransitionResult};
