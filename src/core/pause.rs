//! # Pause gate of a unit.
//!
//! Every submitted task receives a [`PauseHandle`] through
//! [`Task::bind_pause`](crate::Task::bind_pause). The serial worker consults it once,
//! after the task body and its foreground step have completed:
//!
//! ```text
//! body ──► foreground step ──► paused? ──yes──► wait for set_paused(false) ──► finished
//!                                 └──no──────────────────────────────────────► finished
//! ```
//!
//! ## Rules
//! - `set_paused(true)` only records the flag; a unit already past the gate is not blocked.
//! - `set_paused(false)` opens the gate. The gate is one-shot: once opened it stays open.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::latch::Latch;

#[derive(Debug, Default)]
struct PauseState {
    paused: AtomicBool,
    gate: Latch,
}

/// Cloneable handle pausing/resuming one unit.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle {
    inner: Arc<PauseState>,
}

impl PauseHandle {
    /// Creates a handle in the "not paused" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the unit is flagged as paused.
    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    /// Flags (`true`) or resumes (`false`) the unit.
    pub fn set_paused(&self, paused: bool) {
        self.inner.paused.store(paused, Ordering::SeqCst);
        if !paused {
            self.inner.gate.release();
        }
    }

    /// Waits until the gate is opened by `set_paused(false)`.
    pub(crate) async fn wait_resumed(&self) {
        self.inner.gate.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_pause_then_resume() {
        let handle = PauseHandle::new();
        assert!(!handle.is_paused());

        handle.set_paused(true);
        assert!(handle.is_paused());

        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait_resumed().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        handle.set_paused(false);
        assert!(!handle.is_paused());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("resume must open the gate")
            .unwrap();
    }

    #[tokio::test]
    async fn test_resume_is_idempotent() {
        let handle = PauseHandle::new();
        handle.set_paused(false);
        handle.set_paused(false);
        tokio::time::timeout(Duration::from_millis(50), handle.wait_resumed())
            .await
            .expect("opened gate must not block");
    }
}
