//! # One-shot rendezvous.
//!
//! A [`Latch`] starts closed, opens exactly once, and never closes again. Waiters park
//! until it opens; waiting on an open latch returns immediately. Releasing an open latch
//! is a no-op.
//!
//! Units use two distinct latches: one for the foreground hand-off and one for the pause
//! gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Single-count wait/signal primitive.
#[derive(Debug, Default)]
pub(crate) struct Latch {
    open: AtomicBool,
    notify: Notify,
}

impl Latch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Opens the latch and wakes every waiter. Idempotent.
    pub(crate) fn release(&self) {
        if !self.open.swap(true, Ordering::AcqRel) {
            self.notify.notify_waiters();
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Waits until the latch is open.
    pub(crate) async fn wait(&self) {
        loop {
            // Registered before the check: `notify_waiters` wakes futures that already exist.
            let notified = self.notify.notified();
            if self.is_open() {
                return;
            }
            notified.await;
        }
    }
}

/// Opens the latch when dropped, whether or not the owning job ever ran.
pub(crate) struct ReleaseOnDrop(pub(crate) Arc<Latch>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.release();
    }
}
