//! # Runtime events emitted by the sequencer and its units.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Queue events**: enqueue, submission, rejected runs
//! - **Unit lifecycle events**: starting, skipped, failed, paused/resumed, finished, cancelled
//! - **Sequence events**: halted by a task, drained with success/failure, pool shut down
//! - **Foreground events**: a posted job panicked
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! run target and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskline::{Event, EventKind, RunTarget};
//!
//! let ev = Event::new(EventKind::UnitFailed)
//!     .with_task("fetch")
//!     .with_target(RunTarget::Background)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::UnitFailed);
//! assert_eq!(ev.task.as_deref(), Some("fetch"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::tasks::RunTarget;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Queue events ===
    /// Task appended to the pending queue.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `target`: run target
    TaskQueued,

    /// Unit registered in flight and handed to the worker.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `target`: run target
    UnitSubmitted,

    /// `run()` refused to schedule anything.
    ///
    /// Sets:
    /// - `task`: sequencer label
    /// - `reason`: error label
    RunRejected,

    // === Unit lifecycle events ===
    /// Condition passed; the task body is about to run.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `target`: run target
    UnitStarting,

    /// Condition returned `false`; the task body never runs.
    ///
    /// Sets:
    /// - `task`: task name
    UnitSkipped,

    /// Task body (or a sink) failed; the error was recorded on the task.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `target`: run target
    /// - `reason`: error message
    UnitFailed,

    /// Worker is blocked on the unit's pause gate.
    ///
    /// Sets:
    /// - `task`: task name
    UnitPaused,

    /// Pause gate released.
    ///
    /// Sets:
    /// - `task`: task name
    UnitResumed,

    /// Unit reported completion and left the in-flight registry.
    ///
    /// Sets:
    /// - `task`: task name
    UnitFinished,

    /// Unit removed from the in-flight registry by a cancellation.
    ///
    /// Sets:
    /// - `task`: task name
    UnitCancelled,

    // === Sequence events ===
    /// A task asked not to continue; the remaining units are being cancelled.
    ///
    /// Sets:
    /// - `task`: name of the task that stopped the sequence
    SequenceHalted,

    /// Registry drained with no failed task; `on_success` was posted.
    ///
    /// Sets:
    /// - `task`: sequencer label
    SequenceSucceeded,

    /// Registry drained after at least one failure; `on_error` was posted.
    ///
    /// Sets:
    /// - `task`: sequencer label
    SequenceFailed,

    /// Worker pool closed; further `run()` calls are rejected.
    ///
    /// Sets:
    /// - `task`: sequencer label
    PoolShutdown,

    // === Foreground events ===
    /// A job posted by the sequencer panicked on the foreground (e.g. a completion sink).
    ///
    /// Sets:
    /// - `task`: sequencer label
    /// - `reason`: panic info/message
    ForegroundPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task (or sequencer/subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Run target of the task, if applicable.
    pub target: Option<RunTarget>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            target: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a run target.
    #[inline]
    pub fn with_target(mut self, target: RunTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for the two terminal sequence outcomes.
    #[inline]
    pub fn is_sequence_outcome(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SequenceSucceeded | EventKind::SequenceFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::TaskQueued);
        let b = Event::new(EventKind::UnitSubmitted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_subscriber_helpers() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
        assert!(!ev.is_sequence_outcome());
        assert!(Event::new(EventKind::SequenceFailed).is_sequence_outcome());
    }
}
