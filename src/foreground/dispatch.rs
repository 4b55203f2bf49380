//! # Foreground dispatcher contract.
//!
//! A dispatcher accepts zero-argument jobs and runs each of them later, exactly once,
//! on a single serialized "foreground" context (a UI thread, a main loop...), in posting
//! order. `post` must never block the caller.
//!
//! Two implementations ship with the crate:
//! - [`ForegroundThread`](crate::ForegroundThread): a dedicated OS thread.
//! - `tokio::sync::mpsc::UnboundedSender<ForegroundJob>`: hand the receiver to your own
//!   loop and call each received job.
//!
//! ## Example: pumping jobs from a host loop
//! ```rust
//! use std::sync::Arc;
//! use taskline::{Dispatch, ForegroundJob};
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ForegroundJob>();
//! let dispatcher: Arc<dyn Dispatch> = Arc::new(tx);
//!
//! dispatcher.post(Box::new(|| println!("on the host loop")));
//! while let Ok(job) = rx.try_recv() {
//!     job();
//! }
//! ```

use tokio::sync::mpsc;

/// Unit of work posted to the foreground context.
pub type ForegroundJob = Box<dyn FnOnce() + Send + 'static>;

/// Facility that runs posted jobs on one serialized foreground context.
pub trait Dispatch: Send + Sync + 'static {
    /// Schedules `job` to run later on the foreground context.
    ///
    /// Jobs run in posting order. A dispatcher that can no longer run jobs drops them.
    fn post(&self, job: ForegroundJob);
}

impl Dispatch for mpsc::UnboundedSender<ForegroundJob> {
    fn post(&self, job: ForegroundJob) {
        // A closed receiver drops the job; the sequencer notices through the job's guards.
        let _ = self.send(job);
    }
}
