//! # Unit: drives one task through its lifecycle on the serial worker.
//!
//! ## Lifecycle
//! ```text
//! PENDING ──► CONDITION_CHECK ──false──► SKIPPED ─────────────────────────────┐
//!                   │                                                          │
//!                 true                                                         │
//!                   ▼                                                          │
//!               RUNNING                                                        │
//!   background: body runs for the worker; outcome posted to the foreground     │
//!   foreground: body posted to the foreground; worker waits for it             │
//!                   ▼                                                          │
//!              PAUSE_GATE (only if flagged paused: wait for resume)            │
//!                   ▼                                                          │
//!        should_continue() == false ──► halt: cancel every other unit          │
//!                   ▼                                                          ▼
//!               FINISHED ◄─────────────────────────────────────────────────────┘
//!                   └─► coordinator.finished(key)
//! ```
//!
//! ## Rules
//! - Task failures never unwind into the worker: returned errors and panics (in the body,
//!   the condition, or the sinks) are recorded on the task and latch the aggregate flag.
//! - A foreground body has completed (or was dropped by the dispatcher) before the unit
//!   moves past RUNNING.
//! - Outcome sinks (`set_result` / `set_error`) always run on the foreground context,
//!   except when the dispatcher lost a foreground step.
//! - A panic escaping the lifecycle is recorded as the task's error and the unit still
//!   reports completion.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;

use super::coordinator::Coordinator;
use super::latch::{Latch, ReleaseOnDrop};
use super::pause::PauseHandle;
use super::worker::Drive;
use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::tasks::{ConditionSlot, RunTarget, Task, TaskKey};

pub(crate) struct Unit<T: Task> {
    task: Arc<T>,
    key: TaskKey,
    name: Arc<str>,
    target: RunTarget,
    condition: ConditionSlot,
    pause: PauseHandle,
    coordinator: Arc<Coordinator>,
}

impl<T: Task> Unit<T> {
    /// Wraps `task` and binds a fresh pause handle to it.
    pub(crate) fn new(
        task: Arc<T>,
        target: RunTarget,
        condition: ConditionSlot,
        coordinator: Arc<Coordinator>,
    ) -> Self {
        let pause = PauseHandle::new();
        task.bind_pause(pause.clone());
        Self {
            key: TaskKey::of(&task),
            name: Arc::from(task.name()),
            task,
            target,
            condition,
            pause,
            coordinator,
        }
    }

    async fn run(self) {
        if let Err(panic) = AssertUnwindSafe(self.lifecycle()).catch_unwind().await {
            self.recover(TaskError::from_panic(panic));
        }
    }

    async fn lifecycle(&self) {
        if let Some(condition) = self.condition.get() {
            if !condition.should_execute() {
                self.publish(EventKind::UnitSkipped);
                self.coordinator.finished(self.key, &self.name);
                return;
            }
        }

        self.coordinator.publish(
            Event::new(EventKind::UnitStarting)
                .with_task(Arc::clone(&self.name))
                .with_target(self.target),
        );
        match self.target {
            RunTarget::Background => self.run_background().await,
            RunTarget::Foreground => self.run_foreground().await,
        }

        if self.pause.is_paused() {
            self.publish(EventKind::UnitPaused);
            self.pause.wait_resumed().await;
            self.publish(EventKind::UnitResumed);
        }

        if !self.task.should_continue() {
            self.coordinator.halt(self.key, &self.name);
        }
        self.coordinator.finished(self.key, &self.name);
    }

    /// Runs the body off the async threads, then posts the outcome to the foreground.
    ///
    /// If the unit is cancelled meanwhile, the worker still waits for the body to return.
    async fn run_background(&self) {
        let task = Arc::clone(&self.task);
        let outcome = match self.coordinator.spawn_body(move || task.execute()).await {
            Ok(outcome) => outcome,
            Err(join) if join.is_panic() => Err(TaskError::from_panic(join.into_panic())),
            // Only when the runtime shuts down under the body.
            Err(join) => Err(TaskError::fail(join.to_string())),
        };
        if let Err(err) = &outcome {
            self.coordinator.task_failed(&self.name, self.target, err);
        }

        let task = Arc::clone(&self.task);
        let coordinator = Arc::clone(&self.coordinator);
        let name = Arc::clone(&self.name);
        self.coordinator.post(Box::new(move || {
            deliver(&*task, &coordinator, &name, RunTarget::Background, outcome);
        }));
    }

    /// Posts the body to the foreground and waits until it ran there.
    async fn run_foreground(&self) {
        let done = Arc::new(Latch::new());
        let ran = Arc::new(AtomicBool::new(false));

        let release = ReleaseOnDrop(Arc::clone(&done));
        let task = Arc::clone(&self.task);
        let coordinator = Arc::clone(&self.coordinator);
        let name = Arc::clone(&self.name);
        let ran_flag = Arc::clone(&ran);
        self.coordinator.post(Box::new(move || {
            let _release = release;
            ran_flag.store(true, Ordering::SeqCst);
            let outcome = catch_unwind(AssertUnwindSafe(|| task.execute()))
                .unwrap_or_else(|panic| Err(TaskError::from_panic(panic)));
            if let Err(err) = &outcome {
                coordinator.task_failed(&name, RunTarget::Foreground, err);
            }
            deliver(&*task, &coordinator, &name, RunTarget::Foreground, outcome);
        }));

        done.wait().await;
        if !ran.load(Ordering::SeqCst) {
            let err = TaskError::ForegroundLost;
            self.coordinator.task_failed(&self.name, self.target, &err);
            self.task.set_error(err);
        }
    }

    /// Records a failure that escaped the lifecycle, then reports completion anyway.
    fn recover(&self, err: TaskError) {
        self.coordinator.task_failed(&self.name, self.target, &err);
        let task = Arc::clone(&self.task);
        self.coordinator.post(Box::new(move || task.set_error(err)));
        self.coordinator.finished(self.key, &self.name);
    }

    fn publish(&self, kind: EventKind) {
        self.coordinator
            .publish(Event::new(kind).with_task(Arc::clone(&self.name)));
    }
}

impl<T: Task> Drive for Unit<T> {
    fn drive(self: Box<Self>) -> BoxFuture<'static, ()> {
        (*self).run().boxed()
    }
}

/// Hands an outcome to the task's sinks; runs on the foreground context.
///
/// A panicking sink is recorded as the task's error.
fn deliver<T: Task>(
    task: &T,
    coordinator: &Coordinator,
    name: &Arc<str>,
    target: RunTarget,
    outcome: Result<T::Output, TaskError>,
) {
    let sunk = catch_unwind(AssertUnwindSafe(|| match outcome {
        Ok(output) => task.set_result(output),
        Err(err) => task.set_error(err),
    }));
    if let Err(panic) = sunk {
        let err = TaskError::from_panic(panic);
        coordinator.task_failed(name, target, &err);
        let _ = catch_unwind(AssertUnwindSafe(|| task.set_error(err)));
    }
}
