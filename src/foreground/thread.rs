//! # ForegroundThread: a dedicated serialized foreground context.
//!
//! Spawns one named OS thread that drains an unbounded FIFO channel and runs every job in
//! posting order. It is the default dispatcher of [`SequencerBuilder`](crate::SequencerBuilder).
//!
//! ## Rules
//! - Jobs run one at a time, in posting order, on the same thread.
//! - A panicking job is caught; the thread keeps serving later jobs. Jobs posted by a
//!   sequencer catch their own panics and publish them on its event bus.
//! - After [`ForegroundThread::shutdown`] (or drop) posted jobs are dropped unrun.

use std::io;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;

use super::dispatch::{Dispatch, ForegroundJob};

/// Dispatcher backed by a dedicated OS thread.
pub struct ForegroundThread {
    name: String,
    tx: Mutex<Option<mpsc::UnboundedSender<ForegroundJob>>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl ForegroundThread {
    /// Default thread name.
    pub const DEFAULT_NAME: &'static str = "foreground";

    /// Spawns a foreground thread named [`ForegroundThread::DEFAULT_NAME`].
    pub fn spawn() -> io::Result<Self> {
        Self::named(Self::DEFAULT_NAME)
    }

    /// Spawns a foreground thread with the given name.
    pub fn named(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<ForegroundJob>();

        let join = thread::Builder::new().name(name.clone()).spawn(move || {
            while let Some(job) = rx.blocking_recv() {
                let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job));
            }
        })?;

        Ok(Self {
            name,
            tx: Mutex::new(Some(tx)),
            join: Mutex::new(Some(join)),
        })
    }

    /// Thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops accepting jobs, lets already-posted jobs run, and joins the thread.
    ///
    /// Calling it from the foreground thread itself only closes the queue.
    pub fn shutdown(&self) {
        self.close();
        let join = self
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(join) = join {
            if join.thread().id() == thread::current().id() {
                return;
            }
            let _ = join.join();
        }
    }

    fn close(&self) {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl Dispatch for ForegroundThread {
    fn post(&self, job: ForegroundJob) {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = tx.as_ref() {
            let _ = tx.send(job);
        }
    }
}

impl Drop for ForegroundThread {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc as std_mpsc;

    use super::*;

    #[test]
    fn test_jobs_run_in_order_on_named_thread() {
        let fg = ForegroundThread::named("fg-test").unwrap();
        let (tx, rx) = std_mpsc::channel();

        for i in 0..5 {
            let tx = tx.clone();
            fg.post(Box::new(move || {
                let name = thread::current().name().map(str::to_owned);
                tx.send((i, name)).unwrap();
            }));
        }
        fg.shutdown();

        let seen: Vec<_> = rx.try_iter().collect();
        assert_eq!(seen.len(), 5);
        for (i, (n, name)) in seen.into_iter().enumerate() {
            assert_eq!(n, i);
            assert_eq!(name.as_deref(), Some("fg-test"));
        }
    }

    #[test]
    fn test_panicking_job_does_not_kill_thread() {
        let fg = ForegroundThread::spawn().unwrap();
        let (tx, rx) = std_mpsc::channel();

        fg.post(Box::new(|| panic!("job failed")));
        fg.post(Box::new(move || tx.send(()).unwrap()));
        fg.shutdown();

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_post_after_shutdown_drops_job() {
        let fg = Arc::new(ForegroundThread::spawn().unwrap());
        fg.shutdown();

        let (tx, rx) = std_mpsc::channel::<()>();
        fg.post(Box::new(move || tx.send(()).unwrap()));
        assert!(rx.recv().is_err());
    }
}
