//! # Sequencer: public entry point.
//!
//! The [`Sequencer`] collects tasks into a FIFO queue and, on [`Sequencer::run`], turns
//! every queued task into a unit scheduled on the single serial worker.
//!
//! ## Architecture
//! ```text
//! enqueue(task, target) ──► [pending queue] ── run() ──► 1. Coordinator::register (all)
//!          │                                                  └─► Registry::insert(key)
//! attach_condition(c) ──► condition slot of the last task     2. Coordinator::schedule
//!                                                                 └─► Pool (serial worker)
//!
//! unit finished ──► Coordinator::finished ──► registry empty? ──► Completion (foreground)
//! ```
//!
//! ## Rules
//! - `run()` fails once the pool is closed (after completion, `cancel_all`, a continuation
//!   stop or drop). A closed pool never reopens.
//! - Units submitted by one `run()` execute strictly one at a time, in enqueue order.
//! - Enqueuing while a previous batch is still in flight is allowed but not ordered against
//!   it beyond FIFO submission; waiting for the completion sink first is the caller's job.
//! - Enqueuing the same `Arc` twice keeps one registry entry: the later unit replaces the
//!   earlier handle.
//! - The completion sink is write-once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use super::builder::SequencerBuilder;
use super::completion::Completion;
use super::config::SequencerConfig;
use super::coordinator::Coordinator;
use super::unit::Unit;
use super::worker::Drive;
use crate::error::SequenceError;
use crate::events::{Event, EventKind};
use crate::tasks::{Condition, ConditionSlot, RunTarget, Task, TaskKey};

type MakeUnit = Box<dyn FnOnce(Arc<Coordinator>) -> Box<dyn Drive> + Send>;

/// One queued task, waiting for `run()`.
struct Pending {
    key: TaskKey,
    name: Arc<str>,
    target: RunTarget,
    make: MakeUnit,
}

/// A built and registered unit, not yet handed to the worker.
struct Staged {
    key: TaskKey,
    name: Arc<str>,
    target: RunTarget,
    cancel: CancellationToken,
    unit: Box<dyn Drive>,
}

#[derive(Default)]
struct Queue {
    pending: Vec<Pending>,
    last: Option<ConditionSlot>,
}

/// Ordered task sequencer with a single serial worker.
///
/// Built with [`Sequencer::builder`]; must be created inside a Tokio runtime.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use taskline::{CompletionFn, RunTarget, Sequencer, SequencerConfig, TaskFn};
///
/// #[tokio::main]
/// async fn main() -> Result<(), taskline::SequenceError> {
///     let seq = Sequencer::builder(SequencerConfig::default()).build()?;
///
///     let fetch = TaskFn::arc("fetch", || Ok::<_, taskline::TaskError>(21));
///     let double = TaskFn::arc("double", || Ok::<_, taskline::TaskError>(42));
///
///     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<bool>();
///     let err_tx = tx.clone();
///     seq.set_completion(CompletionFn::new(
///         move || { let _ = tx.send(true); },
///         move || { let _ = err_tx.send(false); },
///     ));
///
///     seq.enqueue(fetch.clone(), RunTarget::Background)
///         .enqueue(double.clone(), RunTarget::Foreground);
///     assert!(seq.run());
///
///     assert_eq!(rx.recv().await, Some(true));
///     assert_eq!(double.result(), Some(42));
///     Ok(())
/// }
/// ```
pub struct Sequencer {
    coordinator: Arc<Coordinator>,
    queue: Mutex<Queue>,
    listener: CancellationToken,
}

impl Sequencer {
    /// Returns a builder for a sequencer with the given configuration.
    pub fn builder(cfg: SequencerConfig) -> SequencerBuilder {
        SequencerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(coordinator: Arc<Coordinator>, listener: CancellationToken) -> Self {
        Self {
            coordinator,
            queue: Mutex::new(Queue::default()),
            listener,
        }
    }

    // ---------------------------
    // Assembling
    // ---------------------------

    /// Appends `task` to the pending queue with the given run target.
    ///
    /// Nothing runs until [`Sequencer::run`].
    pub fn enqueue<T: Task>(&self, task: Arc<T>, target: RunTarget) -> &Self {
        let key = TaskKey::of(&task);
        let name: Arc<str> = Arc::from(task.name());
        let condition = ConditionSlot::default();

        let slot = condition.clone();
        let make: MakeUnit = Box::new(move |coordinator| {
            Box::new(Unit::new(task, target, slot, coordinator)) as Box<dyn Drive>
        });

        {
            let mut queue = self.queue();
            queue.pending.push(Pending {
                key,
                name: Arc::clone(&name),
                target,
                make,
            });
            queue.last = Some(condition);
        }
        self.coordinator.publish(
            Event::new(EventKind::TaskQueued)
                .with_task(name)
                .with_target(target),
        );
        self
    }

    /// Attaches `condition` to the most recently enqueued task, replacing any previous one.
    ///
    /// # Errors
    /// [`SequenceError::NoTaskEnqueued`] if nothing was enqueued yet.
    pub fn attach_condition(&self, condition: impl Condition) -> Result<&Self, SequenceError> {
        let queue = self.queue();
        let Some(slot) = queue.last.as_ref() else {
            return Err(SequenceError::NoTaskEnqueued);
        };
        slot.set(Arc::new(condition));
        Ok(self)
    }

    /// Registers the completion sink. Returns `false` if one was already set.
    pub fn set_completion(&self, sink: impl Completion) -> bool {
        self.coordinator.set_completion(Arc::new(sink))
    }

    // ---------------------------
    // Running
    // ---------------------------

    /// Submits every pending task to the worker and clears the queue.
    ///
    /// The whole batch is registered in flight before its first unit reaches the worker.
    /// Returns the number of submitted units; units cancelled while the batch is handed
    /// over are not counted.
    ///
    /// # Errors
    /// - [`SequenceError::Closed`] if the pool is shut down; nothing is scheduled.
    /// - [`SequenceError::Rejected`] if the worker refused a submission; units submitted
    ///   before it stay scheduled, the rest of the batch is withdrawn and latches a failure.
    pub fn try_run(&self) -> Result<usize, SequenceError> {
        if self.coordinator.is_closed() {
            let err = SequenceError::Closed;
            self.coordinator.reject(&err);
            return Err(err);
        }

        let batch = std::mem::take(&mut self.queue().pending);
        let staged: Vec<Staged> = batch
            .into_iter()
            .map(|entry| {
                let unit = (entry.make)(Arc::clone(&self.coordinator));
                let cancel = self.coordinator.register(entry.key, &entry.name);
                Staged {
                    key: entry.key,
                    name: entry.name,
                    target: entry.target,
                    cancel,
                    unit,
                }
            })
            .collect();

        let mut submitted = 0;
        let mut staged = staged.into_iter();
        while let Some(next) = staged.next() {
            if next.cancel.is_cancelled() {
                continue;
            }
            let cancel = next.cancel.clone();
            match self
                .coordinator
                .schedule(next.name, next.target, next.cancel, next.unit)
            {
                Ok(()) => submitted += 1,
                // Cancelled (cancel_all or a halt) while the batch was handed over.
                Err(_) if cancel.is_cancelled() => {}
                Err(err) => {
                    let rest = std::iter::once(next.key).chain(staged.map(|s| s.key));
                    self.coordinator.withdraw(rest);
                    self.coordinator.reject(&err);
                    return Err(err);
                }
            }
        }
        Ok(submitted)
    }

    /// Like [`Sequencer::try_run`], reporting only whether scheduling succeeded.
    pub fn run(&self) -> bool {
        self.try_run().is_ok()
    }

    // ---------------------------
    // Cancelling
    // ---------------------------

    /// Cancels every in-flight unit, empties the registry and closes the pool.
    ///
    /// The completion sink never fires for the cancelled units. Safe to call when idle.
    pub fn cancel_all(&self) {
        self.coordinator.cancel_all();
    }

    /// Cancels the in-flight unit driving `task`.
    ///
    /// Returns `false` if `task` is not in flight. The pool stays open.
    pub fn cancel_one<T: ?Sized>(&self, task: &Arc<T>) -> bool {
        self.coordinator.cancel_one(TaskKey::of(task))
    }

    // ---------------------------
    // Introspection
    // ---------------------------

    /// Number of units submitted but not finished yet.
    pub fn in_flight(&self) -> usize {
        self.coordinator.in_flight()
    }

    /// Number of tasks waiting for the next `run()`.
    pub fn pending(&self) -> usize {
        self.queue().pending.len()
    }

    /// True once the worker pool is shut down.
    pub fn is_closed(&self) -> bool {
        self.coordinator.is_closed()
    }

    fn queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Sequencer {
    /// Closes the pool (submitted units still run) and stops the subscriber listener.
    fn drop(&mut self) {
        self.coordinator.shutdown_pool();
        self.listener.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::core::{CompletionFn, PauseHandle};
    use crate::core::testkit::{Outcome, recorder, sequencer};
    use crate::error::TaskError;
    use crate::tasks::TaskFn;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn traced(trace: Trace, name: &'static str, hold: Duration) -> Arc<impl Task<Output = ()>> {
        TaskFn::arc(name, move || {
            trace.lock().unwrap().push(format!("{name}:start"));
            thread::sleep(hold);
            trace.lock().unwrap().push(format!("{name}:end"));
            Ok::<_, TaskError>(())
        })
    }

    #[tokio::test]
    async fn test_attach_condition_requires_task() {
        let seq = sequencer();
        assert_eq!(
            seq.attach_condition(|| true).err(),
            Some(SequenceError::NoTaskEnqueued)
        );

        let t = TaskFn::arc("t", || Ok::<_, TaskError>(()));
        seq.enqueue(t, RunTarget::Background);
        assert!(seq.attach_condition(|| false).is_ok());
    }

    #[tokio::test]
    async fn test_run_clears_queue_and_counts_units() {
        let seq = sequencer();
        for name in ["a", "b", "c"] {
            seq.enqueue(TaskFn::arc(name, || Ok::<_, TaskError>(())), RunTarget::Background);
        }
        assert_eq!(seq.pending(), 3);
        assert_eq!(seq.try_run(), Ok(3));
        assert_eq!(seq.pending(), 0);
        assert_eq!(seq.try_run(), Ok(0));
    }

    #[tokio::test]
    async fn test_completion_is_write_once() {
        let seq = sequencer();
        assert!(seq.set_completion(CompletionFn::new(|| {}, || {})));
        assert!(!seq.set_completion(CompletionFn::new(|| {}, || {})));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_closed_sequencer_rejects_run() {
        let seq = sequencer();
        seq.cancel_all();
        assert!(seq.is_closed());

        seq.enqueue(TaskFn::arc("late", || Ok::<_, TaskError>(())), RunTarget::Background);
        assert_eq!(seq.try_run(), Err(SequenceError::Closed));
        assert!(!seq.run());
        assert_eq!(seq.pending(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_all_success_fires_on_success_once() {
        let seq = sequencer();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        let tasks: Vec<_> = (0..5_u32)
            .map(|n| TaskFn::arc(format!("task-{n}"), move || Ok::<_, TaskError>(n * 10)))
            .collect();
        for t in &tasks {
            seq.enqueue(Arc::clone(t), RunTarget::Background);
        }
        assert!(seq.run());

        let (outcome, thread) = outcomes.next().await;
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(thread.as_deref(), Some("foreground"));
        for (n, t) in tasks.iter().enumerate() {
            assert_eq!(t.result(), Some(n as u32 * 10));
            assert!(t.error().is_none());
        }
        assert_eq!(seq.in_flight(), 0);
        assert!(seq.is_closed());
        outcomes.assert_silent().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_any_failure_fires_on_error_once() {
        let seq = sequencer();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        let ok = TaskFn::arc("ok", || Ok::<_, TaskError>("fine"));
        let broken = TaskFn::arc("broken", || Err::<&str, _>(TaskError::fail("disk full")));
        let after = TaskFn::arc("after", || Ok::<_, TaskError>("still ran"));
        seq.enqueue(ok.clone(), RunTarget::Background)
            .enqueue(broken.clone(), RunTarget::Background)
            .enqueue(after.clone(), RunTarget::Background);
        assert!(seq.run());

        assert_eq!(outcomes.next().await.0, Outcome::Error);
        assert_eq!(ok.result(), Some("fine"));
        assert_eq!(broken.error(), Some(TaskError::fail("disk full")));
        assert!(broken.result().is_none());
        assert_eq!(after.result(), Some("still ran"));
        outcomes.assert_silent().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_background_tasks_never_overlap() {
        let seq = sequencer();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        let trace: Trace = Arc::default();
        seq.enqueue(traced(trace.clone(), "a", Duration::from_millis(40)), RunTarget::Background)
            .enqueue(traced(trace.clone(), "b", Duration::ZERO), RunTarget::Background)
            .enqueue(traced(trace.clone(), "c", Duration::from_millis(10)), RunTarget::Background);
        assert!(seq.run());

        assert_eq!(outcomes.next().await.0, Outcome::Success);
        assert_eq!(
            *trace.lock().unwrap(),
            ["a:start", "a:end", "b:start", "b:end", "c:start", "c:end"]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_false_condition_skips_task() {
        let seq = sequencer();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        let calls = Arc::new(AtomicUsize::new(0));
        let gated = {
            let calls = Arc::clone(&calls);
            TaskFn::arc("gated", move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TaskError>(())
            })
        };
        let open = TaskFn::arc("open", || Ok::<_, TaskError>(5));
        seq.enqueue(gated.clone(), RunTarget::Foreground)
            .attach_condition(|| false)
            .unwrap()
            .enqueue(open.clone(), RunTarget::Background)
            .attach_condition(|| true)
            .unwrap();
        assert!(seq.run());

        assert_eq!(outcomes.next().await.0, Outcome::Success);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(gated.result().is_none());
        assert!(gated.error().is_none());
        assert_eq!(open.result(), Some(5));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mixed_targets_scenario() {
        let seq = sequencer();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        let a = TaskFn::arc("a", || Ok::<_, TaskError>(thread::current().name().map(str::to_owned)));
        let b = TaskFn::arc("b", || Ok::<_, TaskError>(thread::current().name().map(str::to_owned)));
        let c = TaskFn::arc("c", || Err::<Option<String>, _>(TaskError::fail("c broke")));
        seq.enqueue(a.clone(), RunTarget::Background)
            .enqueue(b.clone(), RunTarget::Foreground)
            .enqueue(c.clone(), RunTarget::Background);
        assert!(seq.run());

        let (outcome, thread) = outcomes.next().await;
        assert_eq!(outcome, Outcome::Error);
        assert_eq!(thread.as_deref(), Some("foreground"));

        assert!(a.result().is_some());
        assert_ne!(a.result().flatten().as_deref(), Some("foreground"));
        assert_eq!(b.result(), Some(Some("foreground".to_string())));
        assert_eq!(c.error(), Some(TaskError::fail("c broke")));
        assert_eq!(seq.in_flight(), 0);
        outcomes.assert_silent().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_after_cancels_the_rest() {
        let seq = sequencer();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        let calls = Arc::new(AtomicUsize::new(0));
        let first = Arc::new(TaskFn::new("first", || Ok::<_, TaskError>(1)).stop_after());
        let second = {
            let calls = Arc::clone(&calls);
            TaskFn::arc("second", move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TaskError>(2)
            })
        };
        seq.enqueue(first.clone(), RunTarget::Background)
            .enqueue(second.clone(), RunTarget::Background);
        assert!(seq.run());

        assert_eq!(outcomes.next().await.0, Outcome::Success);
        assert_eq!(first.result(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(second.result().is_none());
        assert!(second.error().is_none());
        assert!(!seq.run());
        outcomes.assert_silent().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_panics_become_task_errors() {
        let seq = sequencer();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        let bg = TaskFn::arc("bg", || -> Result<(), TaskError> { panic!("bg exploded") });
        let fg = TaskFn::arc("fg", || -> Result<(), TaskError> { panic!("fg exploded") });
        let tail = TaskFn::arc("tail", || Ok::<_, TaskError>(()));
        seq.enqueue(bg.clone(), RunTarget::Background)
            .enqueue(fg.clone(), RunTarget::Foreground)
            .enqueue(tail.clone(), RunTarget::Background);
        assert!(seq.run());

        assert_eq!(outcomes.next().await.0, Outcome::Error);
        assert_eq!(
            bg.error(),
            Some(TaskError::Panicked {
                info: "bg exploded".into()
            })
        );
        assert_eq!(
            fg.error(),
            Some(TaskError::Panicked {
                info: "fg exploded".into()
            })
        );
        assert_eq!(tail.result(), Some(()));
    }

    /// Task that takes its time accepting the pause handle.
    #[derive(Default)]
    struct SlowBind {
        ran: AtomicBool,
    }

    impl Task for SlowBind {
        type Output = ();

        fn name(&self) -> &str {
            "slow-bind"
        }

        fn execute(&self) -> Result<(), TaskError> {
            self.ran.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn set_result(&self, _output: ()) {}

        fn set_error(&self, _error: TaskError) {}

        fn bind_pause(&self, _handle: PauseHandle) {
            thread::sleep(Duration::from_millis(200));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_early_finisher_waits_for_whole_batch() {
        let seq = sequencer();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        let quick = TaskFn::arc("quick", || Ok::<_, TaskError>(()));
        let slow = Arc::new(SlowBind::default());
        seq.enqueue(quick.clone(), RunTarget::Background)
            .enqueue(slow.clone(), RunTarget::Background);
        assert_eq!(seq.try_run(), Ok(2));

        assert_eq!(outcomes.next().await.0, Outcome::Success);
        assert_eq!(quick.result(), Some(()));
        assert!(slow.ran.load(Ordering::SeqCst));
        outcomes.assert_silent().await;
    }
}
