//! Recoverable conditions met during a run.
//!
//! Components never log these directly; they hand a [`SamplerEvent`] to the [`Reporter`]
//! they were given and carry on.

use std::fmt::{self, Display};
use std::sync::Mutex;

use log::warn;

use gcmatch_core::models::Locus;

#[derive(Debug, Clone, PartialEq)]
pub enum SamplerEvent {
    /// A positive's composition window ran past a chromosome edge and was clipped.
    BoundaryClip { locus: Locus, window: Locus },
    /// A GC bin had fewer eligible candidates than positives.
    CoverageShortfall {
        bin: usize,
        target: usize,
        drawn: usize,
    },
    /// A chromosome is shorter than one window and was not scanned.
    ChromosomeSkipped { chr: String, length: u32 },
}

impl Display for SamplerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerEvent::BoundaryClip { locus, window } => write!(
                f,
                "window of positive {} clipped to chromosome bounds as {}",
                locus, window
            ),
            SamplerEvent::CoverageShortfall { bin, target, drawn } => write!(
                f,
                "GC bin {} is short by {}: {} of {} negatives drawn",
                bin,
                target - drawn,
                drawn,
                target
            ),
            SamplerEvent::ChromosomeSkipped { chr, length } => write!(
                f,
                "chromosome {} ({} bp) is shorter than one window and was not scanned",
                chr, length
            ),
        }
    }
}

///
/// Receiver of [`SamplerEvent`]s. Shared between worker threads.
///
pub trait Reporter: Send + Sync {
    fn report(&self, event: SamplerEvent);
}

/// Forwards every event to the `log` facade at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: SamplerEvent) {
        warn!("{}", event);
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<SamplerEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SamplerEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn into_events(self) -> Vec<SamplerEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, event: SamplerEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_collecting_reporter_keeps_order() {
        let reporter = CollectingReporter::new();
        reporter.report(SamplerEvent::ChromosomeSkipped {
            chr: "chrM".to_string(),
            length: 16569,
        });
        reporter.report(SamplerEvent::CoverageShortfall {
            bin: 3,
            target: 5,
            drawn: 2,
        });

        let events = reporter.into_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SamplerEvent::ChromosomeSkipped { .. }));
        assert!(matches!(events[1], SamplerEvent::CoverageShortfall { bin: 3, .. }));
    }

    #[rstest]
    fn test_shortfall_message() {
        let event = SamplerEvent::CoverageShortfall {
            bin: 7,
            target: 5,
            drawn: 2,
        };
        assert_eq!(
            event.to_string(),
            "GC bin 7 is short by 3: 2 of 5 negatives drawn"
        );
    }
}
