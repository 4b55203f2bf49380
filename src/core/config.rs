//! # Sequencer configuration.
//!
//! Provides [`SequencerConfig`], the settings consumed by
//! [`Sequencer::builder`](crate::Sequencer::builder).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1

use std::borrow::Cow;

/// Configuration for one sequencer.
///
/// ## Field semantics
/// - `label`: name stamped on sequence-level events (`RunRejected`, `Sequence*`, `PoolShutdown`)
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct SequencerConfig {
    /// Human-readable name of the sequencer.
    pub label: Cow<'static, str>,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages skip older items.
    pub bus_capacity: usize,
}

impl SequencerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a copy with a different label.
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }
}

impl Default for SequencerConfig {
    /// Default configuration:
    ///
    /// - `label = "sequencer"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("sequencer"),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamp() {
        let cfg = SequencerConfig::default();
        assert_eq!(cfg.label, "sequencer");
        assert_eq!(cfg.bus_capacity_clamped(), 1024);

        let cfg = SequencerConfig {
            bus_capacity: 0,
            ..SequencerConfig::default()
        }
        .with_label("uploads");
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.label, "uploads");
    }
}
