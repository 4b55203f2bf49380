//! # taskline
//!
//! **Taskline** is a small in-process task sequencer for Rust.
//!
//! It runs an ordered list of synchronous, fallible tasks on a single serial worker,
//! routes selected tasks to a serialized "foreground" context (a UI thread, a main
//! loop...), and reports one aggregate outcome once every task has finished. Tasks can
//! be skipped by a condition, paused mid-sequence, cancelled one by one or all at once,
//! and can stop the rest of the sequence after themselves.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Task  A    │   │   Task  B    │   │   Task  C    │
//!     │ (background) │   │ (foreground) │   │ (background) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ enqueue          ▼ enqueue          ▼ enqueue
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Sequencer                                                        │
//! │  - pending queue (FIFO, cleared by run())                         │
//! │  - Coordinator: in-flight Registry, error latch, Completion sink  │
//! │  - Bus (broadcast events)                                         │
//! └──────┬─────────────────────────────────────────────────────┬──────┘
//!        ▼ run(): one Unit per task                            │
//! ┌──────────────────────────────┐   post(job)   ┌─────────────┴─────────┐
//! │  serial worker (one task)    │ ────────────► │  foreground dispatcher │
//! │  Unit A ─► Unit B ─► Unit C  │ ◄──────────── │  (ForegroundThread or  │
//! │  (never overlapping)         │  leg finished │   your own Dispatch)   │
//! └──────────────┬───────────────┘               └───────────┬───────────┘
//!                ▼                                           ▼
//!       unit finished ──► registry empty? ──► on_success / on_error (foreground)
//! ```
//!
//! ### Unit lifecycle
//! ```text
//! condition? ──false──► skipped ─────────────────────────────────┐
//!     │ true                                                      │
//!     ▼                                                           │
//! background: execute on the worker, post outcome to foreground   │
//! foreground: post execute to foreground, worker waits for it     │
//!     ▼                                                           │
//! paused? ──► wait for set_paused(false)                          │
//!     ▼                                                           │
//! should_continue() == false ──► cancel every other unit          │
//!     ▼                                                           ▼
//! finished ──► registry.finish(task) ──► drained? ──► completion sink (once)
//! ```
//!
//! ## Features
//! | Area              | Description                                                            | Key types / traits                         |
//! |-------------------|------------------------------------------------------------------------|--------------------------------------------|
//! | **Sequencing**    | Queue tasks, run them serially, cancel, observe in-flight units.       | [`Sequencer`], [`SequencerBuilder`]        |
//! | **Tasks**         | Define tasks as trait impls or closures, gate them with conditions.    | [`Task`], [`TaskFn`], [`Condition`]        |
//! | **Foreground**    | Run selected tasks and all outcome sinks on one serialized context.    | [`Dispatch`], [`ForegroundThread`]         |
//! | **Outcome**       | One terminal notification per sequence; pause units mid-sequence.      | [`Completion`], [`PauseHandle`]            |
//! | **Subscriber API**| Hook into queue and unit lifecycle events.                             | [`Subscribe`], [`Event`], [`EventKind`]    |
//! | **Errors**        | Typed errors for sequencing and task execution.                        | [`SequenceError`], [`TaskError`]           |
//! | **Configuration** | Centralize sequencer settings.                                         | [`SequencerConfig`]                        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use taskline::{CompletionFn, RunTarget, Sequencer, SequencerConfig, TaskError, TaskFn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskline::Subscribe>> = vec![Arc::new(taskline::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskline::Subscribe>> = Vec::new();
//!
//!     let seq = Sequencer::builder(SequencerConfig::default())
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     let download = TaskFn::arc("download", || Ok::<_, TaskError>(vec![1_u8, 2, 3]));
//!     let render = TaskFn::arc("render", || Ok::<_, TaskError>("rendered"));
//!
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<&'static str>();
//!     let err_tx = tx.clone();
//!     seq.set_completion(CompletionFn::new(
//!         move || { let _ = tx.send("success"); },
//!         move || { let _ = err_tx.send("error"); },
//!     ));
//!
//!     seq.enqueue(download.clone(), RunTarget::Background)
//!         .enqueue(render.clone(), RunTarget::Foreground)
//!         .attach_condition(|| true)?;
//!     seq.try_run()?;
//!
//!     assert_eq!(rx.recv().await, Some("success"));
//!     assert_eq!(download.result(), Some(vec![1, 2, 3]));
//!     assert_eq!(render.result(), Some("rendered"));
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod foreground;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{
    Completion, CompletionFn, PauseHandle, Sequencer, SequencerBuilder, SequencerConfig,
};
pub use error::{SequenceError, TaskError};
pub use events::{Event, EventKind};
pub use foreground::{Dispatch, ForegroundJob, ForegroundThread};
pub use subscribers::Subscribe;
pub use tasks::{Condition, RunTarget, Task, TaskFn};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
