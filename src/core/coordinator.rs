//! # Coordinator: shared state behind a sequencer.
//!
//! Owns the in-flight [`Registry`], the aggregate error latch, the completion sink, the
//! worker [`Pool`], the foreground dispatcher and the event bus. Units receive an
//! `Arc<Coordinator>` when they are created and report back through it.
//!
//! ## Drain flow
//! ```text
//! Unit finished ──► registry.finish(key)
//!                      ├─ removed && drained && sink set && not fired yet
//!                      │     ├─► pool.shutdown()
//!                      │     └─► dispatcher.post(on_success | on_error)
//!                      └─ otherwise: nothing more
//! ```
//!
//! ## Rules
//! - The aggregate flag is a monotonic latch: it only ever moves from clean to failed.
//! - The completion sink fires at most once, and only from a removal that emptied the
//!   registry. Cancellations remove entries without ever firing it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use super::completion::Completion;
use super::registry::{Handle, Registry};
use super::worker::{Body, Drive, Pool, Scheduled};
use crate::error::{SequenceError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::foreground::{Dispatch, ForegroundJob};
use crate::tasks::{RunTarget, TaskKey};

pub(crate) struct Coordinator {
    label: Arc<str>,
    registry: Registry,
    clean: Arc<AtomicBool>,
    completion: OnceLock<Arc<dyn Completion>>,
    fired: AtomicBool,
    pool: Pool,
    dispatcher: Arc<dyn Dispatch>,
    bus: Bus,
}

impl Coordinator {
    /// Creates the coordinator and starts its worker on the current Tokio runtime.
    pub(crate) fn start(label: Arc<str>, dispatcher: Arc<dyn Dispatch>, bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            label,
            registry: Registry::new(),
            clean: Arc::new(AtomicBool::new(true)),
            completion: OnceLock::new(),
            fired: AtomicBool::new(false),
            pool: Pool::start(),
            dispatcher,
            bus,
        })
    }

    // ---------------------------
    // Scheduling
    // ---------------------------

    /// Registers a unit as in flight and returns its scheduling handle.
    ///
    /// Every unit of a batch is registered before the first one is scheduled, so an early
    /// finisher can never drain the registry while the rest of the batch is still arriving.
    pub(crate) fn register(&self, key: TaskKey, name: &Arc<str>) -> CancellationToken {
        let cancel = CancellationToken::new();
        self.registry.insert(
            key,
            Handle {
                name: Arc::clone(name),
                cancel: cancel.clone(),
            },
        );
        cancel
    }

    /// Removes registered units that never reached the worker.
    ///
    /// The batch did not run as a whole, so the outcome latches to failed. If this empties
    /// the registry, the completion sink fires as it would for a finished unit.
    pub(crate) fn withdraw(&self, keys: impl IntoIterator<Item = TaskKey>) {
        self.clean.store(false, Ordering::SeqCst);
        let mut drained = false;
        for key in keys {
            drained |= self.registry.finish(key).drained;
        }
        if drained {
            self.complete();
        }
    }

    /// Hands a registered unit to the worker.
    pub(crate) fn schedule(
        &self,
        name: Arc<str>,
        target: RunTarget,
        cancel: CancellationToken,
        unit: Box<dyn Drive>,
    ) -> Result<(), SequenceError> {
        let scheduled = Scheduled {
            name: Arc::clone(&name),
            cancel,
            unit,
        };
        self.pool.submit(scheduled)?;
        self.bus.publish(
            Event::new(EventKind::UnitSubmitted)
                .with_task(name)
                .with_target(target),
        );
        Ok(())
    }

    /// Runs a blocking task body for the unit currently on the worker.
    pub(crate) fn spawn_body<F, R>(&self, body: F) -> Body<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.pool.spawn_body(body)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.registry.len()
    }

    pub(crate) fn reject(&self, err: &SequenceError) {
        self.bus.publish(
            Event::new(EventKind::RunRejected)
                .with_task(Arc::clone(&self.label))
                .with_reason(err.as_label()),
        );
    }

    pub(crate) fn shutdown_pool(&self) {
        if self.pool.shutdown() {
            self.bus
                .publish(Event::new(EventKind::PoolShutdown).with_task(Arc::clone(&self.label)));
        }
    }

    // ---------------------------
    // Outcome tracking
    // ---------------------------

    pub(crate) fn set_completion(&self, sink: Arc<dyn Completion>) -> bool {
        self.completion.set(sink).is_ok()
    }

    /// Latches the batch outcome to "has errors" and reports the failure.
    pub(crate) fn task_failed(&self, name: &Arc<str>, target: RunTarget, err: &TaskError) {
        self.clean.store(false, Ordering::SeqCst);
        self.bus.publish(
            Event::new(EventKind::UnitFailed)
                .with_task(Arc::clone(name))
                .with_target(target)
                .with_reason(err.to_string()),
        );
    }

    /// Removes a finished unit; fires the completion sink if that drained the registry.
    ///
    /// Reporting the same unit twice is harmless.
    pub(crate) fn finished(&self, key: TaskKey, name: &Arc<str>) {
        let removal = self.registry.finish(key);
        if !removal.removed {
            return;
        }
        self.bus
            .publish(Event::new(EventKind::UnitFinished).with_task(Arc::clone(name)));
        if removal.drained {
            self.complete();
        }
    }

    fn complete(&self) {
        let Some(sink) = self.completion.get().cloned() else {
            return;
        };
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown_pool();

        // Read on the foreground: outcome sinks posted earlier may still latch a failure.
        let clean = Arc::clone(&self.clean);
        let bus = self.bus.clone();
        let label = Arc::clone(&self.label);
        self.post(Box::new(move || {
            if clean.load(Ordering::SeqCst) {
                bus.publish(Event::new(EventKind::SequenceSucceeded).with_task(label));
                sink.on_success();
            } else {
                bus.publish(Event::new(EventKind::SequenceFailed).with_task(label));
                sink.on_error();
            }
        }));
    }

    // ---------------------------
    // Cancellation
    // ---------------------------

    /// Cancels every in-flight unit and closes the pool.
    pub(crate) fn cancel_all(&self) {
        self.cancel_handles(self.registry.drain());
        self.shutdown_pool();
    }

    /// Cancels one in-flight unit; the pool stays open.
    pub(crate) fn cancel_one(&self, key: TaskKey) -> bool {
        match self.registry.take(key) {
            Some(handle) => {
                self.cancel_handles(vec![handle]);
                true
            }
            None => false,
        }
    }

    /// A task asked not to continue: cancels every other unit and closes the pool.
    ///
    /// The stopping unit stays registered so its own report still drains the registry.
    pub(crate) fn halt(&self, key: TaskKey, name: &Arc<str>) {
        self.bus
            .publish(Event::new(EventKind::SequenceHalted).with_task(Arc::clone(name)));
        self.cancel_handles(self.registry.drain_except(key));
        self.shutdown_pool();
    }

    fn cancel_handles(&self, handles: Vec<Handle>) {
        for handle in handles {
            handle.cancel.cancel();
            self.bus
                .publish(Event::new(EventKind::UnitCancelled).with_task(handle.name));
        }
    }

    // ---------------------------
    // Plumbing
    // ---------------------------

    /// Posts `job` to the foreground; a panic inside it is published, never unwound.
    pub(crate) fn post(&self, job: ForegroundJob) {
        let bus = self.bus.clone();
        let label = Arc::clone(&self.label);
        self.dispatcher.post(Box::new(move || {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
                bus.publish(
                    Event::new(EventKind::ForegroundPanicked)
                        .with_task(label)
                        .with_reason(TaskError::from_panic(panic).as_message()),
                );
            }
        }));
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }
}
