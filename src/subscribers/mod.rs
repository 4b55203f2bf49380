//! # Event subscribers for the taskline sequencer.
//!
//! This module provides the [`Subscribe`] trait, the internal `SubscriberSet` fan-out and the
//! built-in [`LogWriter`] for handling events broadcast through the internal bus.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Sequencer / Unit ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                                    │
//!                                                          ┌─────────┼─────────┐
//!                                                          ▼         ▼         ▼
//!                                                      LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub(crate) use set::SubscriberSet;
pub use subscribe::Subscribe;
