//! Wall-clock abstraction and cooperative cancellation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest single sleep while a [`StopSignal`] is being watched.
const STOP_POLL_SLICE: Duration = Duration::from_millis(50);

/// Source of monotonic wall time.
///
/// `now` is measured from an arbitrary fixed origin.
pub trait WallClock {
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

impl<W: WallClock + ?Sized> WallClock for &W {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// The real monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when told to.
///
/// `sleep` advances the clock instead of blocking. Clones share the same
/// time, so a test can keep a handle while a session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Shared cancellation flag for a live session.
///
/// Cloning yields a handle to the same flag; any handle can stop the
/// session.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sleeps in short slices, waking early on cancellation.
    ///
    /// Returns `false` if the signal fired before or during the sleep.
    pub fn sleep<W: WallClock + ?Sized>(&self, wall: &W, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.is_stopped() {
                return false;
            }
            let slice = remaining.min(STOP_POLL_SLICE);
            wall.sleep(slice);
            remaining -= slice;
        }
        !self.is_stopped()
    }
}

/// Sleeps on `wall`, watching `stop` if one is given.
///
/// Returns `false` if cancelled.
pub fn sleep_unless_stopped<W: WallClock + ?Sized>(
    wall: &W,
    stop: Option<&StopSignal>,
    duration: Duration,
) -> bool {
    match stop {
        Some(stop) => stop.sleep(wall, duration),
        None => {
            wall.sleep(duration);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.sleep(Duration::from_millis(200));
        clock.advance(Duration::from_secs(1));

        assert_eq!(clock.now(), Duration::from_millis(1200));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        clock.advance(Duration::from_secs(5));
        assert_eq!(handle.now(), Duration::from_secs(5));
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_stop_signal_shared() {
        let signal = StopSignal::new();
        let handle = signal.clone();
        assert!(!signal.is_stopped());

        handle.stop();
        assert!(signal.is_stopped());
    }

    #[test]
    fn test_stop_signal_sleep() {
        let clock = ManualClock::new();
        let signal = StopSignal::new();

        assert!(signal.sleep(&clock, Duration::from_millis(120)));
        assert_eq!(clock.now(), Duration::from_millis(120));

        signal.stop();
        assert!(!signal.sleep(&clock, Duration::from_secs(10)));
        // Nothing slept once stopped
        assert_eq!(clock.now(), Duration::from_millis(120));
    }

    #[test]
    fn test_sleep_without_signal() {
        let clock = ManualClock::new();
        assert!(sleep_unless_stopped(&clock, None, Duration::from_secs(2)));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }
}
