//! Runtime core: sequencing and unit lifecycle.
//!
//! This module contains the embedded implementation of the taskline sequencer.
//! The public API from this module is [`Sequencer`] (with its builder and config),
//! the [`Completion`] sink and the per-unit [`PauseHandle`].
//!
//! Internal modules:
//! - [`coordinator`]: in-flight registry, aggregate error latch, completion trigger;
//! - [`unit`]: drives one task through condition, execution, foreground hand-off, pause;
//! - [`worker`]: the single serial worker;
//! - [`registry`]: in-flight units keyed by task identity;
//! - [`latch`]: one-shot rendezvous used by the foreground hand-off and the pause gate.

mod builder;
mod completion;
mod config;
mod coordinator;
mod latch;
mod pause;
mod registry;
mod sequencer;
#[cfg(test)]
mod testkit;
mod unit;
mod worker;

pub use builder::SequencerBuilder;
pub use completion::{Completion, CompletionFn};
pub use config::SequencerConfig;
pub use pause::PauseHandle;
pub use sequencer::Sequencer;
