//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the sequencer, its units and the
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Sequencer` (queue/run/cancel), `Coordinator` (drain, halt),
//!   `Unit` (lifecycle), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `SequencerBuilder::build`, which fans out
//!   to the `SubscriberSet`.

mod bus;
mod event;

pub(crate) use bus::Bus;
pub use event::{Event, EventKind};
