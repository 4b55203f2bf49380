use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use super::{config::SequencerConfig, coordinator::Coordinator, sequencer::Sequencer};
use crate::{
    error::SequenceError,
    events::{Bus, Event},
    foreground::{Dispatch, ForegroundThread},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Sequencer`] with optional features.
pub struct SequencerBuilder {
    cfg: SequencerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    dispatcher: Option<Arc<dyn Dispatch>>,
}

impl SequencerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SequencerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            dispatcher: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (queueing, unit lifecycle, completion)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the foreground dispatcher.
    ///
    /// Foreground task bodies, outcome sinks and the completion sink run on it.
    /// Without one, `build` spawns a [`ForegroundThread`].
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatch>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Builds and returns the Sequencer instance.
    ///
    /// This consumes the builder and initializes all runtime components:
    /// - Event bus for broadcasting
    /// - Subscriber workers and their listener (only with subscribers)
    /// - Foreground dispatcher (default thread if none was given)
    /// - The serial worker
    ///
    /// # Panics
    /// Outside a Tokio runtime.
    ///
    /// # Errors
    /// [`SequenceError::ForegroundSpawn`] if the default foreground thread cannot start.
    pub fn build(self) -> Result<Sequencer, SequenceError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = CancellationToken::new();
        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            subscriber_listener(bus.subscribe(), set, listener.clone());
        }

        let dispatcher = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => {
                let thread =
                    ForegroundThread::spawn().map_err(|e| SequenceError::ForegroundSpawn {
                        reason: e.to_string(),
                    })?;
                Arc::new(thread) as Arc<dyn Dispatch>
            }
        };

        let label: Arc<str> = Arc::from(&*self.cfg.label);
        let coordinator = Coordinator::start(label, dispatcher, bus);
        Ok(Sequencer::new_internal(coordinator, listener))
    }
}

/// Forwards bus events to the subscriber set until `stop` fires or the bus closes.
///
/// Lagged receivers skip ahead. Events already received are delivered before the
/// subscriber workers shut down.
fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    stop: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => break,
            }
        }
        set.shutdown().await;
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::core::CompletionFn;
    use crate::core::testkit::{Outcome, recorder, wait_until};
    use crate::error::TaskError;
    use crate::events::EventKind;
    use crate::foreground::ForegroundJob;
    use crate::tasks::{RunTarget, TaskFn};

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<Event>>,
    }

    impl Collect {
        fn kinds(&self) -> Vec<EventKind> {
            self.seen.lock().unwrap().iter().map(|ev| ev.kind).collect()
        }

        fn find(&self, kind: EventKind) -> Option<Event> {
            self.seen.lock().unwrap().iter().find(|ev| ev.kind == kind).cloned()
        }
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.clone());
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_subscribers_see_lifecycle() {
        let collect = Arc::new(Collect::default());
        let seq = SequencerBuilder::new(SequencerConfig::default().with_label("lifecycle"))
            .with_subscribers(vec![collect.clone() as Arc<dyn Subscribe>])
            .build()
            .unwrap();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        seq.enqueue(TaskFn::arc("a", || Ok::<_, TaskError>(())), RunTarget::Background)
            .enqueue(TaskFn::arc("b", || Ok::<_, TaskError>(())), RunTarget::Foreground)
            .attach_condition(|| false)
            .unwrap();
        assert!(seq.run());
        assert_eq!(outcomes.next().await.0, Outcome::Success);

        wait_until(|| collect.kinds().contains(&EventKind::SequenceSucceeded)).await;
        let kinds = collect.kinds();
        for kind in [
            EventKind::TaskQueued,
            EventKind::UnitSubmitted,
            EventKind::UnitStarting,
            EventKind::UnitSkipped,
            EventKind::UnitFinished,
            EventKind::PoolShutdown,
        ] {
            assert!(kinds.contains(&kind), "missing {kind:?} in {kinds:?}");
        }
        assert!(!kinds.contains(&EventKind::UnitFailed));
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::UnitFinished).count(),
            2
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejected_run_is_published() {
        let collect = Arc::new(Collect::default());
        let seq = SequencerBuilder::new(SequencerConfig::default())
            .with_subscribers(vec![collect.clone() as Arc<dyn Subscribe>])
            .build()
            .unwrap();

        seq.cancel_all();
        assert!(!seq.run());
        wait_until(|| collect.kinds().contains(&EventKind::RunRejected)).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_custom_dispatcher_runs_foreground_work() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ForegroundJob>();
        std::thread::Builder::new()
            .name("host-loop".into())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    job();
                }
            })
            .unwrap();

        let seq = SequencerBuilder::new(SequencerConfig::default())
            .with_dispatcher(Arc::new(tx))
            .build()
            .unwrap();
        let (sink, mut outcomes) = recorder();
        seq.set_completion(sink);

        let ui = TaskFn::arc("ui", || {
            Ok::<_, TaskError>(std::thread::current().name().map(str::to_owned))
        });
        seq.enqueue(ui.clone(), RunTarget::Foreground);
        assert!(seq.run());

        let (outcome, thread) = outcomes.next().await;
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(thread.as_deref(), Some("host-loop"));
        assert_eq!(ui.result(), Some(Some("host-loop".to_string())));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_panicking_completion_is_published() {
        let collect = Arc::new(Collect::default());
        let seq = SequencerBuilder::new(SequencerConfig::default().with_label("fragile"))
            .with_subscribers(vec![collect.clone() as Arc<dyn Subscribe>])
            .build()
            .unwrap();
        seq.set_completion(CompletionFn::new(|| panic!("sink exploded"), || {}));

        seq.enqueue(TaskFn::arc("a", || Ok::<_, TaskError>(())), RunTarget::Background);
        assert!(seq.run());

        wait_until(|| collect.find(EventKind::ForegroundPanicked).is_some()).await;
        let ev = collect.find(EventKind::ForegroundPanicked).unwrap();
        assert_eq!(ev.task.as_deref(), Some("fragile"));
        assert_eq!(ev.reason.as_deref(), Some("panic: sink exploded"));
        assert!(!collect.kinds().contains(&EventKind::UnitFailed));
    }
}
