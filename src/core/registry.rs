//! # In-flight registry.
//!
//! Tracks every unit that was submitted to the worker and has not fully finished yet.
//! Keys are task identities, values hold the unit's scheduling handle (its
//! [`CancellationToken`]).
//!
//! ## Architecture
//! ```text
//! Sequencer::run()      ──► insert(key, handle)      (before the unit reaches the worker)
//! Unit (worker)         ──► finish(key)              → Removal { removed, drained }
//! Sequencer::cancel_one ──► take(key)                → cancel token
//! Sequencer::cancel_all ──► drain()                  → cancel every token
//! halt after a task     ──► drain_except(key)        → cancel all other tokens
//! ```
//!
//! ## Rules
//! - Every operation is a single critical section; removal and the "now empty?" check
//!   happen under the same lock.
//! - Removing an absent key is a no-op and never reports a drain.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::tasks::TaskKey;

/// Scheduling handle of one in-flight unit.
#[derive(Debug, Clone)]
pub(crate) struct Handle {
    /// Task name (for events).
    pub(crate) name: Arc<str>,
    /// Cancels the unit on the worker.
    pub(crate) cancel: CancellationToken,
}

/// Outcome of [`Registry::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Removal {
    /// The key was present and is now gone.
    pub(crate) removed: bool,
    /// This removal left the registry empty.
    pub(crate) drained: bool,
}

/// Thread-safe map of in-flight units.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    units: Mutex<HashMap<TaskKey, Handle>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a unit; a previous entry for the same task is replaced.
    pub(crate) fn insert(&self, key: TaskKey, handle: Handle) {
        self.units().insert(key, handle);
    }

    /// Removes a finished unit and reports whether the registry just drained.
    pub(crate) fn finish(&self, key: TaskKey) -> Removal {
        let mut units = self.units();
        let removed = units.remove(&key).is_some();
        Removal {
            removed,
            drained: removed && units.is_empty(),
        }
    }

    /// Removes one unit without reporting a drain.
    pub(crate) fn take(&self, key: TaskKey) -> Option<Handle> {
        self.units().remove(&key)
    }

    /// Empties the registry.
    pub(crate) fn drain(&self) -> Vec<Handle> {
        self.units().drain().map(|(_, h)| h).collect()
    }

    /// Removes every unit except `keep`.
    pub(crate) fn drain_except(&self, keep: TaskKey) -> Vec<Handle> {
        let mut units = self.units();
        let others: Vec<TaskKey> = units.keys().copied().filter(|k| *k != keep).collect();
        others
            .into_iter()
            .filter_map(|k| units.remove(&k))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.units().len()
    }

    fn units(&self) -> MutexGuard<'_, HashMap<TaskKey, Handle>> {
        self.units.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
