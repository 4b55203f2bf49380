//! Shared fixtures for the sequencer tests.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use super::{Completion, Sequencer, SequencerConfig};

const PATIENCE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success,
    Error,
}

/// Completion sink forwarding each call, with the name of the calling thread.
pub(crate) struct Recorder {
    tx: mpsc::UnboundedSender<(Outcome, Option<String>)>,
}

impl Recorder {
    fn send(&self, outcome: Outcome) {
        let thread = std::thread::current().name().map(str::to_owned);
        let _ = self.tx.send((outcome, thread));
    }
}

impl Completion for Recorder {
    fn on_success(&self) {
        self.send(Outcome::Success);
    }

    fn on_error(&self) {
        self.send(Outcome::Error);
    }
}

pub(crate) struct Outcomes {
    rx: mpsc::UnboundedReceiver<(Outcome, Option<String>)>,
}

impl Outcomes {
    /// Next sink call and the thread it ran on.
    pub(crate) async fn next(&mut self) -> (Outcome, Option<String>) {
        tokio::time::timeout(PATIENCE, self.rx.recv())
            .await
            .expect("completion sink did not fire")
            .expect("recorder dropped")
    }

    /// Asserts the sink stays quiet for a while.
    pub(crate) async fn assert_silent(&mut self) {
        match tokio::time::timeout(Duration::from_millis(200), self.rx.recv()).await {
            Err(_) | Ok(None) => {}
            Ok(Some(call)) => panic!("unexpected completion: {call:?}"),
        }
    }
}

pub(crate) fn recorder() -> (Recorder, Outcomes) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Recorder { tx }, Outcomes { rx })
}

pub(crate) fn sequencer() -> Sequencer {
    Sequencer::builder(SequencerConfig::default())
        .build()
        .expect("foreground thread")
}

/// Blocking gate for task bodies; opened once from the test.
#[derive(Clone, Default)]
pub(crate) struct Gate {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    pub(crate) fn wait(&self) {
        let (open, cvar) = &*self.inner;
        let guard = open.lock().unwrap();
        let (guard, _) = cvar
            .wait_timeout_while(guard, PATIENCE, |open| !*open)
            .unwrap();
        assert!(*guard, "gate never opened");
    }

    pub(crate) fn open(&self) {
        let (open, cvar) = &*self.inner;
        *open.lock().unwrap() = true;
        cvar.notify_all();
    }
}

/// Polls `cond` until it holds.
pub(crate) async fn wait_until(mut cond: impl FnMut() -> bool) {
    let polled = tokio::time::timeout(PATIENCE, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });
    polled.await.expect("condition never held");
}

/// Waits for a task body to report that it started.
pub(crate) async fn started(rx: &mut mpsc::UnboundedReceiver<()>) {
    tokio::time::timeout(PATIENCE, rx.recv())
        .await
        .expect("task never started")
        .expect("task dropped its start signal");
}
