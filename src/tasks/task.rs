//! # Task abstraction.
//!
//! This module defines the [`Task`] trait consumed by the sequencer, plus the
//! identity key used by the in-flight registry.
//!
//! A task is owned by the caller (`Arc<T>`) for the whole sequence; the sequencer only
//! drives it and writes outcomes back through [`Task::set_result`] / [`Task::set_error`].

use std::sync::Arc;

use crate::{core::PauseHandle, error::TaskError};

/// # Synchronous, fallible unit of work.
///
/// `execute` runs either on the serial worker or on the foreground context, depending on
/// the [`RunTarget`](crate::RunTarget) it was enqueued with. Outcome sinks are always
/// invoked on the foreground context.
///
/// # Example
/// ```
/// use std::sync::Mutex;
/// use taskline::{Task, TaskError};
///
/// struct Sum {
///     total: Mutex<Option<u64>>,
/// }
///
/// impl Task for Sum {
///     type Output = u64;
///
///     fn name(&self) -> &str { "sum" }
///
///     fn execute(&self) -> Result<u64, TaskError> {
///         Ok((1..=10).sum())
///     }
///
///     fn set_result(&self, output: u64) {
///         *self.total.lock().unwrap() = Some(output);
///     }
///
///     fn set_error(&self, _error: TaskError) {}
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Value produced by a successful execution.
    type Output: Send + 'static;

    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Runs the task body.
    ///
    /// Panics are caught by the sequencer and recorded as [`TaskError::Panicked`].
    fn execute(&self) -> Result<Self::Output, TaskError>;

    /// Receives the output of a successful execution.
    fn set_result(&self, output: Self::Output);

    /// Receives the error of a failed execution.
    fn set_error(&self, error: TaskError);

    /// Asked once, after the task finished; `false` cancels the rest of the sequence.
    fn should_continue(&self) -> bool {
        true
    }

    /// Receives the pause handle of the unit driving this task.
    ///
    /// Called once per submission, when `run()` creates the unit for this task.
    fn bind_pause(&self, _handle: PauseHandle) {}
}

/// Identity of a task inside the sequencer: the address of its `Arc` allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TaskKey(usize);

impl TaskKey {
    pub(crate) fn of<T: ?Sized>(task: &Arc<T>) -> Self {
        TaskKey(Arc::as_ptr(task) as *const () as usize)
    }
}
