//! # Serial worker pool.
//!
//! A fixed pool of exactly one worker: a single Tokio task that receives scheduled units
//! over an unbounded FIFO channel and drives them one at a time.
//!
//! ## Architecture
//! ```text
//! Sequencer::run() ──► Pool::submit(Scheduled) ──► [FIFO] ──► worker loop
//!                                                               │
//!                                        cancelled already? ────┤── skip
//!                                                               ▼
//!                                  select! { cancel.cancelled(), unit.drive() }
//! ```
//!
//! ## Rules
//! - Units never overlap: unit N+1 is received only after unit N's drive future completed
//!   or was cancelled, and after any blocking body it started has returned.
//! - Cancellation drops the unit's drive future at its next suspension point; no further
//!   step of that unit runs and it never reports completion. A blocking body cannot be
//!   interrupted: its [`Body`] hands the join handle to the worker, which waits for it
//!   and discards the outcome.
//! - [`Pool::shutdown`] closes the submission side; queued units are still received and
//!   the worker exits once the queue is empty. A closed pool never reopens.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::error::SequenceError;

/// A type-erased unit that can be driven to completion on the worker.
pub(crate) trait Drive: Send + 'static {
    fn drive(self: Box<Self>) -> BoxFuture<'static, ()>;
}

/// One unit handed to the worker, with its scheduling handle.
pub(crate) struct Scheduled {
    pub(crate) name: Arc<str>,
    pub(crate) cancel: CancellationToken,
    pub(crate) unit: Box<dyn Drive>,
}

/// Blocking body abandoned by a cancelled unit, still to be awaited by the worker.
#[derive(Clone, Default)]
struct Leftover(Arc<Mutex<Option<BoxFuture<'static, ()>>>>);

impl Leftover {
    fn put(&self, body: BoxFuture<'static, ()>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(body);
    }

    async fn settle(&self) {
        let body = self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(body) = body {
            body.await;
        }
    }
}

/// A task body running on the blocking pool on behalf of the current unit.
///
/// Resolves to the body's outcome. Dropped before that (the unit was cancelled), it
/// leaves the join handle to the worker instead of detaching the body.
pub(crate) struct Body<R: Send + 'static> {
    handle: Option<JoinHandle<R>>,
    leftover: Leftover,
}

impl<R: Send + 'static> Future for Body<R> {
    type Output = Result<R, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(handle) = self.handle.as_mut() else {
            return Poll::Pending;
        };
        let out = ready!(Pin::new(handle).poll(cx));
        self.handle = None;
        Poll::Ready(out)
    }
}

impl<R: Send + 'static> Drop for Body<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.leftover.put(
                async move {
                    let _ = handle.await;
                }
                .boxed(),
            );
        }
    }
}

/// Single-worker pool.
pub(crate) struct Pool {
    tx: Mutex<Option<mpsc::UnboundedSender<Scheduled>>>,
    leftover: Leftover,
}

impl Pool {
    /// Spawns the worker on the current Tokio runtime.
    pub(crate) fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Scheduled>();
        let leftover = Leftover::default();
        tokio::spawn(worker_loop(rx, leftover.clone()));
        Self {
            tx: Mutex::new(Some(tx)),
            leftover,
        }
    }

    /// Runs a blocking body for the unit currently on the worker.
    pub(crate) fn spawn_body<F, R>(&self, body: F) -> Body<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        Body {
            handle: Some(tokio::task::spawn_blocking(body)),
            leftover: self.leftover.clone(),
        }
    }

    /// Queues a unit for the worker.
    pub(crate) fn submit(&self, job: Scheduled) -> Result<(), SequenceError> {
        let tx = self.sender();
        let Some(tx) = tx.as_ref() else {
            return Err(SequenceError::Closed);
        };
        tx.send(job).map_err(|rejected| SequenceError::Rejected {
            task: rejected.0.name.to_string(),
        })
    }

    /// Closes the pool. Returns `true` if this call closed it.
    pub(crate) fn shutdown(&self) -> bool {
        self.sender().take().is_some()
    }

    /// True once the pool was shut down or the worker is gone.
    pub(crate) fn is_closed(&self) -> bool {
        self.sender().as_ref().is_none_or(|tx| tx.is_closed())
    }

    fn sender(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<Scheduled>>> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn worker_loop(mut rx: mpsc::UnboundedReceiver<Scheduled>, leftover: Leftover) {
    while let Some(job) = rx.recv().await {
        if job.cancel.is_cancelled() {
            continue;
        }
        let unit = job.unit.drive();
        tokio::select! {
            biased;
            _ = job.cancel.cancelled() => {}
            _ = unit => {}
        }
        leftover.settle().await;
    }
}
