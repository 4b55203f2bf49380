//! # Completion sink.
//!
//! The caller-supplied terminal callback pair. The sequencer invokes it at most once per
//! run cycle, on the foreground context, when the in-flight registry drains:
//! - [`Completion::on_success`] if no task failed,
//! - [`Completion::on_error`] if at least one task failed.
//!
//! Per-task errors stay attached to each task for inspection.

/// Terminal notification of a sequence.
pub trait Completion: Send + Sync + 'static {
    /// Every task finished (or was skipped) without error.
    fn on_success(&self);

    /// At least one task recorded an error.
    fn on_error(&self);
}

impl<C: Completion> Completion for std::sync::Arc<C> {
    fn on_success(&self) {
        (**self).on_success()
    }

    fn on_error(&self) {
        (**self).on_error()
    }
}

/// Closure-backed [`Completion`].
///
/// ```rust
/// use taskline::{Completion, CompletionFn};
///
/// let sink = CompletionFn::new(|| println!("all good"), || eprintln!("something failed"));
/// sink.on_success();
/// ```
pub struct CompletionFn<S, E> {
    success: S,
    error: E,
}

impl<S, E> CompletionFn<S, E>
where
    S: Fn() + Send + Sync + 'static,
    E: Fn() + Send + Sync + 'static,
{
    pub fn new(success: S, error: E) -> Self {
        Self { success, error }
    }
}

impl<S, E> Completion for CompletionFn<S, E>
where
    S: Fn() + Send + Sync + 'static,
    E: Fn() + Send + Sync + 'static,
{
    fn on_success(&self) {
        (self.success)()
    }

    fn on_error(&self) {
        (self.error)()
    }
}
