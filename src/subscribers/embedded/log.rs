//! # LogWriter — simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [queued] task="fetch" target=background
//! [starting] task="fetch" target=background
//! [failed] task="fetch" err="execution failed: timeout"
//! [finished] task="fetch"
//! [halted] task="login"
//! [sequence-failed] sequencer="sequencer"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn target(e: &Event) -> &'static str {
    e.target.map(|t| t.as_label()).unwrap_or("-")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TaskQueued => println!("[queued] task={task:?} target={}", target(e)),
            EventKind::UnitSubmitted => {
                println!("[submitted] task={task:?} target={}", target(e))
            }
            EventKind::RunRejected => println!("[run-rejected] sequencer={task:?} err={reason}"),
            EventKind::UnitStarting => println!("[starting] task={task:?} target={}", target(e)),
            EventKind::UnitSkipped => println!("[skipped] task={task:?}"),
            EventKind::UnitFailed => println!("[failed] task={task:?} err={reason:?}"),
            EventKind::UnitPaused => println!("[paused] task={task:?}"),
            EventKind::UnitResumed => println!("[resumed] task={task:?}"),
            EventKind::UnitFinished => println!("[finished] task={task:?}"),
            EventKind::UnitCancelled => println!("[cancelled] task={task:?}"),
            EventKind::SequenceHalted => println!("[halted] task={task:?}"),
            EventKind::SequenceSucceeded => println!("[sequence-succeeded] sequencer={task:?}"),
            EventKind::SequenceFailed => println!("[sequence-failed] sequencer={task:?}"),
            EventKind::PoolShutdown => println!("[pool-shutdown] sequencer={task:?}"),
            EventKind::ForegroundPanicked => {
                println!("[foreground-panicked] sequencer={task:?} info={reason}")
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={task:?} reason={reason}")
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={task} info={reason}")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
