//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn() -> Result<O, TaskError>` and keeps the outcome the
//! sequencer reports back, so callers can inspect it once the sequence is done.
//!
//! ## Example
//! ```rust
//! use taskline::{Task, TaskFn, TaskError};
//!
//! let t = TaskFn::arc("answer", || Ok::<_, TaskError>(42));
//! assert_eq!(t.name(), "answer");
//! assert!(t.result().is_none());
//! ```

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::PauseHandle;
use crate::error::TaskError;
use crate::tasks::task::Task;

/// Last outcome reported by the sequencer.
struct Outcome<O> {
    result: Option<O>,
    error: Option<TaskError>,
}

/// Function-backed task implementation.
pub struct TaskFn<F, O> {
    name: Cow<'static, str>,
    f: F,
    outcome: Mutex<Outcome<O>>,
    proceed: AtomicBool,
    pause: Mutex<Option<PauseHandle>>,
}

impl<F, O> TaskFn<F, O>
where
    F: Fn() -> Result<O, TaskError> + Send + Sync + 'static,
    O: Send + 'static,
{
    /// Creates a new function-backed task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            outcome: Mutex::new(Outcome {
                result: None,
                error: None,
            }),
            proceed: AtomicBool::new(true),
            pause: Mutex::new(None),
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Marks the task as the last one: once it finishes, the rest of the sequence is cancelled.
    #[must_use]
    pub fn stop_after(self) -> Self {
        self.proceed.store(false, Ordering::SeqCst);
        self
    }
}

impl<F, O> TaskFn<F, O> {
    /// Changes whether the sequence continues after this task.
    pub fn set_continue(&self, proceed: bool) {
        self.proceed.store(proceed, Ordering::SeqCst);
    }

    /// Returns a clone of the recorded result, if any.
    pub fn result(&self) -> Option<O>
    where
        O: Clone,
    {
        self.outcome().result.clone()
    }

    /// Moves the recorded result out.
    pub fn take_result(&self) -> Option<O> {
        self.outcome().result.take()
    }

    /// Returns the recorded error, if any.
    pub fn error(&self) -> Option<TaskError> {
        self.outcome().error.clone()
    }

    /// Returns the pause handle of the latest submission, if any.
    pub fn pause_handle(&self) -> Option<PauseHandle> {
        self.pause
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn outcome(&self) -> MutexGuard<'_, Outcome<O>> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F, O> Task for TaskFn<F, O>
where
    F: Fn() -> Result<O, TaskError> + Send + Sync + 'static,
    O: Send + 'static,
{
    type Output = O;

    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<O, TaskError> {
        (self.f)()
    }

    fn set_result(&self, output: O) {
        self.outcome().result = Some(output);
    }

    fn set_error(&self, error: TaskError) {
        self.outcome().error = Some(error);
    }

    fn should_continue(&self) -> bool {
        self.proceed.load(Ordering::SeqCst)
    }

    fn bind_pause(&self, handle: PauseHandle) {
        *self.pause.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_sinks() {
        let t = TaskFn::new("t", || Ok::<_, TaskError>(String::from("done")));
        let out = t.execute().unwrap();
        t.set_result(out);
        assert_eq!(t.result().as_deref(), Some("done"));
        assert_eq!(t.take_result().as_deref(), Some("done"));
        assert!(t.result().is_none());

        t.set_error(TaskError::fail("late"));
        assert_eq!(t.error(), Some(TaskError::fail("late")));
    }

    #[test]
    fn test_stop_after() {
        let t = TaskFn::new("t", || Ok::<_, TaskError>(()));
        assert!(t.should_continue());
        let t = t.stop_after();
        assert!(!t.should_continue());
        t.set_continue(true);
        assert!(t.should_continue());
    }

    #[test]
    fn test_pause_follows_latest_submission() {
        let t = TaskFn::new("t", || Ok::<_, TaskError>(()));
        assert!(t.pause_handle().is_none());

        let first = PauseHandle::new();
        first.set_paused(true);
        t.bind_pause(first);
        assert!(t.pause_handle().is_some_and(|h| h.is_paused()));

        t.bind_pause(PauseHandle::new());
        assert!(t.pause_handle().is_some_and(|h| !h.is_paused()));
    }
}
