//! # Execution gate consulted right before a task runs.
//!
//! A [`Condition`] is evaluated at most once per unit, immediately before the task body.
//! When it returns `false` the task is skipped: no result, no error, and the unit still
//! counts as finished.
//!
//! Any `Fn() -> bool + Send + Sync` closure is a condition:
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use taskline::Condition;
//!
//! let online = Arc::new(AtomicBool::new(false));
//! let cond = {
//!     let online = online.clone();
//!     move || online.load(Ordering::SeqCst)
//! };
//! assert!(!cond.should_execute());
//! online.store(true, Ordering::SeqCst);
//! assert!(cond.should_execute());
//! ```

use std::sync::{Arc, Mutex, PoisonError};

/// Predicate gating the execution of a single task.
pub trait Condition: Send + Sync + 'static {
    /// Returns `true` if the task should run.
    fn should_execute(&self) -> bool;
}

impl<F> Condition for F
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    fn should_execute(&self) -> bool {
        self()
    }
}

/// Shared slot holding the condition of one queued task.
///
/// The sequencer keeps a handle to the slot of the most recently enqueued task so a
/// condition can be attached after `enqueue`; the unit reads it when it starts.
#[derive(Clone, Default)]
pub(crate) struct ConditionSlot {
    inner: Arc<Mutex<Option<Arc<dyn Condition>>>>,
}

impl ConditionSlot {
    pub(crate) fn set(&self, condition: Arc<dyn Condition>) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(condition);
    }

    pub(crate) fn get(&self) -> Option<Arc<dyn Condition>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_replaces_condition() {
        let slot = ConditionSlot::default();
        assert!(slot.get().is_none());

        slot.set(Arc::new(|| false));
        assert!(!slot.get().map(|c| c.should_execute()).unwrap_or(true));

        let shared = slot.clone();
        shared.set(Arc::new(|| true));
        assert!(slot.get().map(|c| c.should_execute()).unwrap_or(false));
    }
}
