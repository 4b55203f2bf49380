//! Error types used by the taskline sequencer and its tasks.
//!
//! This module defines two main error enums:
//!
//! - [`SequenceError`] — errors raised by the sequencer itself (scheduling, misuse).
//! - [`TaskError`] — errors raised by individual task executions.
//!
//! Both types provide an `as_label` helper for logs/events.

use std::any::Any;

use thiserror::Error;

/// # Errors produced by the sequencer.
///
/// These represent failures of the coordination layer itself, never of a task body.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// A condition was attached before any task was enqueued.
    #[error("no task has been enqueued yet; enqueue a task before attaching a condition")]
    NoTaskEnqueued,

    /// The worker pool was shut down or terminated; it never reopens.
    #[error("worker pool is shut down")]
    Closed,

    /// The worker refused a submission (its queue is gone).
    #[error("worker rejected submission of task {task:?}")]
    Rejected {
        /// Name of the task that could not be submitted.
        task: String,
    },

    /// The built-in foreground thread could not be spawned.
    #[error("failed to spawn foreground thread: {reason}")]
    ForegroundSpawn {
        /// OS error rendered as text.
        reason: String,
    },
}

impl SequenceError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use taskline::SequenceError;
    ///
    /// assert_eq!(SequenceError::Closed.as_label(), "sequence_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SequenceError::NoTaskEnqueued => "sequence_no_task_enqueued",
            SequenceError::Closed => "sequence_closed",
            SequenceError::Rejected { .. } => "sequence_rejected",
            SequenceError::ForegroundSpawn { .. } => "sequence_foreground_spawn",
        }
    }
}

/// # Errors produced by task execution.
///
/// Recorded onto the task through [`Task::set_error`](crate::Task::set_error);
/// any of them latches the batch outcome to "has errors".
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task body returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task body (or one of its sinks) panicked.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The foreground dispatcher dropped the foreground leg without running it.
    #[error("foreground step was dropped before it ran")]
    ForegroundLost,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Converts a caught panic payload into [`TaskError::Panicked`].
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let info = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskError::Panicked { info }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use taskline::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::ForegroundLost => "task_foreground_lost",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::ForegroundLost => "foreground step lost".to_string(),
        }
    }
}
