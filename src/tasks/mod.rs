//! # Task abstractions.
//!
//! This module provides the task-related types consumed by the sequencer:
//! - [`Task`] - trait for synchronous, fallible units of work
//! - [`TaskFn`] - function-backed task that records its outcome
//! - [`RunTarget`] - background worker vs. foreground context
//! - [`Condition`] - predicate gating a single task

mod condition;
mod target;
mod task;
mod task_fn;

pub(crate) use condition::ConditionSlot;
pub(crate) use task::TaskKey;

pub use condition::Condition;
pub use target::RunTarget;
pub use task::Task;
pub use task_fn::TaskFn;
