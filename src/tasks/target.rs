//! # Run target of a queued task.

use std::fmt;

/// Selects the execution context of a task body.
///
/// - [`RunTarget::Background`]: the body runs on the sequencer's serial worker.
/// - [`RunTarget::Foreground`]: the body is posted to the foreground dispatcher and the
///   worker waits until it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunTarget {
    #[default]
    Background,
    Foreground,
}

impl RunTarget {
    /// Returns a short stable label for logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunTarget::Background => "background",
            RunTarget::Foreground => "foreground",
        }
    }
}

impl fmt::Display for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
