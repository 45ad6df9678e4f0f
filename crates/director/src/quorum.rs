//! Quorum-median sampling of a noisy time source.
//!
//! Takes a short burst of samples, requires a minimum number of parseable
//! ones and settles on the median. Used for start detection, periodic
//! validation and end detection alike.

use tracing::debug;

use crate::config::SamplingConfig;
use crate::timesource::{TimeSource, TimerReading};
use crate::wallclock::{sleep_unless_stopped, StopSignal, WallClock};

/// Result of one sampling burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuorumOutcome {
    /// Enough samples parsed; `reading` is their median
    Consensus { reading: TimerReading, agreeing: usize },
    /// Too few samples parsed to trust any of them
    NoQuorum { parsed: usize },
    /// The stop signal fired mid-burst
    Cancelled,
}

impl QuorumOutcome {
    /// The consensus reading, if any.
    pub fn reading(&self) -> Option<&TimerReading> {
        match self {
            QuorumOutcome::Consensus { reading, .. } => Some(reading),
            _ => None,
        }
    }
}

/// Takes `config.samples` samples spaced `config.sample_interval()` apart.
///
/// With at least `config.quorum` parseable samples, the median is the
/// element at index `len / 2` after sorting by seconds, so with an even
/// count the upper middle wins.
pub fn sample_quorum<S, W>(
    source: &mut S,
    wall: &W,
    config: &SamplingConfig,
    stop: Option<&StopSignal>,
) -> QuorumOutcome
where
    S: TimeSource + ?Sized,
    W: WallClock + ?Sized,
{
    let mut readings: Vec<TimerReading> = Vec::with_capacity(config.samples);

    for i in 0..config.samples {
        if stop.is_some_and(StopSignal::is_stopped) {
            return QuorumOutcome::Cancelled;
        }
        if let Some(reading) = source.sample() {
            readings.push(reading);
        }
        if i + 1 < config.samples && !sleep_unless_stopped(wall, stop, config.sample_interval()) {
            return QuorumOutcome::Cancelled;
        }
    }

    if readings.len() < config.quorum {
        debug!(
            "No quorum: {}/{} samples parsed, {} needed",
            readings.len(),
            config.samples,
            config.quorum
        );
        return QuorumOutcome::NoQuorum {
            parsed: readings.len(),
        };
    }

    readings.sort_by_key(|r| r.seconds);
    let agreeing = readings.len();
    let reading = readings.swap_remove(agreeing / 2);
    QuorumOutcome::Consensus { reading, agreeing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timesource::ScriptedTimeSource;
    use crate::wallclock::ManualClock;
    use std::time::Duration;

    fn seconds(outcome: &QuorumOutcome) -> Option<u32> {
        outcome.reading().map(|r| r.seconds)
    }

    #[test]
    fn test_median_of_three() {
        let mut source = ScriptedTimeSource::new([Some(64), Some(62), Some(63)]);
        let clock = ManualClock::new();

        let outcome = sample_quorum(&mut source, &clock, &SamplingConfig::default(), None);

        assert_eq!(seconds(&outcome), Some(63));
        assert!(matches!(outcome, QuorumOutcome::Consensus { agreeing: 3, .. }));
        // Two gaps between three samples
        assert_eq!(clock.now(), Duration::from_millis(400));
    }

    #[test]
    fn test_two_of_three_uses_upper_middle() {
        let mut source = ScriptedTimeSource::new([Some(100), None, Some(98)]);
        let clock = ManualClock::new();

        let outcome = sample_quorum(&mut source, &clock, &SamplingConfig::default(), None);
        assert_eq!(seconds(&outcome), Some(100));
    }

    #[test]
    fn test_single_reading_is_no_quorum() {
        let mut source = ScriptedTimeSource::new([None, Some(50), None]);
        let clock = ManualClock::new();

        let outcome = sample_quorum(&mut source, &clock, &SamplingConfig::default(), None);
        assert_eq!(outcome, QuorumOutcome::NoQuorum { parsed: 1 });
    }

    #[test]
    fn test_all_unparseable() {
        let mut source = ScriptedTimeSource::default();
        let clock = ManualClock::new();

        let outcome = sample_quorum(&mut source, &clock, &SamplingConfig::default(), None);
        assert_eq!(outcome, QuorumOutcome::NoQuorum { parsed: 0 });
    }

    #[test]
    fn test_cancelled_before_sampling() {
        let mut source = ScriptedTimeSource::new([Some(1), Some(2), Some(3)]);
        let clock = ManualClock::new();
        let stop = StopSignal::new();
        stop.stop();

        let outcome = sample_quorum(&mut source, &clock, &SamplingConfig::default(), Some(&stop));

        assert_eq!(outcome, QuorumOutcome::Cancelled);
        assert_eq!(source.remaining(), 3);
    }

    #[test]
    fn test_cancelled_mid_burst() {
        let stop = StopSignal::new();
        let trigger = stop.clone();
        let mut calls = 0;
        let mut source = crate::timesource::FnTimeSource(|| {
            calls += 1;
            trigger.stop();
            Some(TimerReading::from_seconds(10))
        });
        let clock = ManualClock::new();

        let outcome = sample_quorum(&mut source, &clock, &SamplingConfig::default(), Some(&stop));

        assert_eq!(outcome, QuorumOutcome::Cancelled);
        drop(source);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_custom_sampling() {
        let config = SamplingConfig {
            samples: 5,
            quorum: 3,
            sample_interval_ms: 100,
        };
        let mut source = ScriptedTimeSource::new([Some(10), None, Some(12), None, Some(11)]);
        let clock = ManualClock::new();

        let outcome = sample_quorum(&mut source, &clock, &config, None);

        assert_eq!(seconds(&outcome), Some(11));
        assert_eq!(clock.now(), Duration::from_millis(400));
    }
}
