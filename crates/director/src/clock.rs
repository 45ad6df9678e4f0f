//! Game-time estimation against a noisy external timer.
//!
//! The clock detects the replay start from the on-screen timer, then
//! extrapolates game time from wall time and re-checks the timer when asked.
//! Phases only move forward: not started, started, ended.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use cast_events::{format_game_time, GameSeconds};

use crate::config::{ClockConfig, DirectorConfig, SamplingConfig};
use crate::quorum::{sample_quorum, QuorumOutcome};
use crate::timesource::TimeSource;
use crate::wallclock::{sleep_unless_stopped, StopSignal, WallClock};

/// Lifecycle phase of a [`GameClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockPhase {
    NotStarted,
    Started,
    Ended,
}

impl fmt::Display for ClockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockPhase::NotStarted => write!(f, "not started"),
            ClockPhase::Started => write!(f, "started"),
            ClockPhase::Ended => write!(f, "ended"),
        }
    }
}

/// Calibration state of a [`GameClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    pub phase: ClockPhase,
    /// Wall time the current calibration was taken at
    pub start_wall: Option<Duration>,
    /// Game time at `start_wall`
    pub start_offset: GameSeconds,
    /// Wall time of the last accepted sample
    pub last_sample_wall: Option<Duration>,
    pub last_sample: Option<GameSeconds>,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            phase: ClockPhase::NotStarted,
            start_wall: None,
            start_offset: 0,
            last_sample_wall: None,
            last_sample: None,
        }
    }
}

/// Outcome of a single start-detection burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartProbe {
    /// The clock is running; carries the start offset
    Started(GameSeconds),
    /// Timer visible but still in loading-screen range
    Loading(GameSeconds),
    NoQuorum,
    Cancelled,
}

/// Result of a validation against the external timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCheck {
    /// `false` when drift exceeded the threshold and the clock recalibrated
    pub valid: bool,
    /// Absolute drift in seconds; `None` when no consensus was reached
    pub drift: Option<u32>,
}

impl SyncCheck {
    fn no_information() -> Self {
        Self {
            valid: true,
            drift: None,
        }
    }

    pub fn recalibrated(&self) -> bool {
        !self.valid
    }
}

/// Estimates game time from wall time, anchored by an external timer.
pub struct GameClock<S, W> {
    source: S,
    wall: W,
    duration: GameSeconds,
    config: ClockConfig,
    sampling: SamplingConfig,
    state: ClockState,
    stop: Option<StopSignal>,
}

impl<S: TimeSource, W: WallClock> GameClock<S, W> {
    /// Creates a clock for a replay of `duration` seconds with default settings.
    pub fn new(source: S, wall: W, duration: GameSeconds) -> Self {
        Self {
            source,
            wall,
            duration,
            config: ClockConfig::default(),
            sampling: SamplingConfig::default(),
            state: ClockState::default(),
            stop: None,
        }
    }

    /// Creates a clock using the clock and sampling sections of a config.
    pub fn from_config(source: S, wall: W, duration: GameSeconds, config: &DirectorConfig) -> Self {
        Self::new(source, wall, duration).with_config(config.clock.clone(), config.sampling.clone())
    }

    pub fn with_config(mut self, config: ClockConfig, sampling: SamplingConfig) -> Self {
        self.config = config;
        self.sampling = sampling;
        self
    }

    /// Makes sampling bursts and waits abort when `stop` fires.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn phase(&self) -> ClockPhase {
        self.state.phase
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn duration(&self) -> GameSeconds {
        self.duration
    }

    pub fn wall(&self) -> &W {
        &self.wall
    }

    pub fn is_started(&self) -> bool {
        self.state.phase != ClockPhase::NotStarted
    }

    pub fn is_ended(&self) -> bool {
        self.state.phase == ClockPhase::Ended
    }

    fn sample(&mut self) -> QuorumOutcome {
        sample_quorum(&mut self.source, &self.wall, &self.sampling, self.stop.as_ref())
    }

    fn calibrate(&mut self, reading: GameSeconds) {
        let now = self.wall.now();
        self.state.start_wall = Some(now);
        self.state.start_offset = reading;
        self.accept_sample(reading, now);
    }

    fn accept_sample(&mut self, reading: GameSeconds, now: Duration) {
        self.state.last_sample_wall = Some(now);
        self.state.last_sample = Some(reading);
    }

    /// Takes one sampling burst looking for the replay start.
    ///
    /// A consensus below the loading threshold is reported as
    /// [`StartProbe::Loading`] and does not start the clock.
    pub fn poll_start(&mut self) -> StartProbe {
        if self.is_started() {
            return StartProbe::Started(self.state.start_offset);
        }

        match self.sample() {
            QuorumOutcome::Consensus { reading, agreeing } => {
                if reading.seconds < self.config.min_start_reading {
                    debug!("Timer at {}, waiting for the game to load", reading.raw);
                    return StartProbe::Loading(reading.seconds);
                }
                self.calibrate(reading.seconds);
                self.state.phase = ClockPhase::Started;
                info!(
                    "Replay started at {} ({}/{} samples agree)",
                    format_game_time(reading.seconds),
                    agreeing,
                    self.sampling.samples
                );
                StartProbe::Started(reading.seconds)
            }
            QuorumOutcome::NoQuorum { .. } => StartProbe::NoQuorum,
            QuorumOutcome::Cancelled => StartProbe::Cancelled,
        }
    }

    /// Polls until the replay starts or `timeout` of wall time passes.
    ///
    /// Returns `false` on timeout or cancellation.
    pub fn wait_for_start(&mut self, timeout: Duration) -> bool {
        let deadline = self.wall.now() + timeout;

        while self.wall.now() < deadline {
            let pause = match self.poll_start() {
                StartProbe::Started(_) => return true,
                StartProbe::Cancelled => return false,
                StartProbe::Loading(_) => self.config.loading_backoff(),
                StartProbe::NoQuorum => self.config.start_poll_interval(),
            };
            if !sleep_unless_stopped(&self.wall, self.stop.as_ref(), pause) {
                return false;
            }
        }

        warn!("Replay start not detected within {:?}", timeout);
        false
    }

    /// Current game time estimate; 0 before the start.
    pub fn estimated_time(&self) -> GameSeconds {
        let Some(start_wall) = self.state.start_wall else {
            return 0;
        };
        let elapsed = self.wall.now().saturating_sub(start_wall);
        let advanced = (elapsed.as_secs_f64() * self.config.speed_multiplier).floor() as GameSeconds;
        self.state.start_offset.saturating_add(advanced)
    }

    /// The estimate formatted as `M:SS`.
    pub fn formatted(&self) -> String {
        format_game_time(self.estimated_time())
    }

    /// Compares the estimate with a fresh consensus reading.
    ///
    /// Drift beyond the threshold recalibrates the clock to the reading.
    /// Without consensus, or before the start, the check is valid with no
    /// drift information.
    pub fn validate(&mut self) -> SyncCheck {
        if !self.is_started() {
            return SyncCheck::no_information();
        }

        let reading = match self.sample() {
            QuorumOutcome::Consensus { reading, .. } => reading,
            QuorumOutcome::NoQuorum { .. } | QuorumOutcome::Cancelled => {
                return SyncCheck::no_information()
            }
        };

        let estimate = self.estimated_time();
        let drift = reading.seconds.abs_diff(estimate);

        if drift > self.config.drift_threshold {
            warn!(
                "Clock drift {}s (timer {}, clock {}), recalibrating",
                drift,
                reading.raw,
                format_game_time(estimate)
            );
            self.calibrate(reading.seconds);
            return SyncCheck {
                valid: false,
                drift: Some(drift),
            };
        }

        let now = self.wall.now();
        self.accept_sample(reading.seconds, now);
        debug!("Clock in sync, drift {}s", drift);
        SyncCheck {
            valid: true,
            drift: Some(drift),
        }
    }

    /// Checks whether the replay has reached its end.
    ///
    /// Near the expected end the timer is sampled for confirmation; far past
    /// it the clock ends regardless.
    pub fn check_ended(&mut self) -> bool {
        match self.state.phase {
            ClockPhase::Ended => return true,
            ClockPhase::NotStarted => return false,
            ClockPhase::Started => {}
        }

        let estimate = self.estimated_time();

        if estimate >= self.duration.saturating_sub(self.config.end_window) {
            if let QuorumOutcome::Consensus { reading, agreeing } = self.sample() {
                if reading.seconds >= self.duration.saturating_sub(self.config.end_margin) {
                    info!(
                        "Replay ended at {} ({}/{} samples agree)",
                        reading.raw, agreeing, self.sampling.samples
                    );
                    self.state.phase = ClockPhase::Ended;
                    return true;
                }
            }
        }

        if estimate >= self.duration.saturating_add(self.config.end_fallback) {
            info!("Replay ended at {} (past expected duration)", format_game_time(estimate));
            self.state.phase = ClockPhase::Ended;
            return true;
        }

        false
    }

    /// True once `interval` of wall time has passed since the last accepted
    /// sample. End-detection samples do not count.
    pub fn should_validate_now(&self, interval: Duration) -> bool {
        if !self.is_started() {
            return false;
        }
        match self.state.last_sample_wall {
            Some(last) => self.wall.now().saturating_sub(last) >= interval,
            None => false,
        }
    }
}

impl<S, W> fmt::Debug for GameClock<S, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameClock")
            .field("duration", &self.duration)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timesource::ScriptedTimeSource;
    use crate::wallclock::ManualClock;

    type TestClock = GameClock<ScriptedTimeSource, ManualClock>;

    fn clock_with(samples: &[Option<GameSeconds>], duration: GameSeconds) -> (TestClock, ManualClock) {
        let wall = ManualClock::new();
        let source = ScriptedTimeSource::new(samples.iter().copied());
        (GameClock::new(source, wall.clone(), duration), wall)
    }

    fn started_at(offset: GameSeconds, duration: GameSeconds) -> (TestClock, ManualClock) {
        let (mut clock, wall) = clock_with(&[Some(offset); 3], duration);
        assert_eq!(clock.poll_start(), StartProbe::Started(offset));
        (clock, wall)
    }

    fn push_burst(clock: &mut TestClock, seconds: GameSeconds) {
        clock.source.push_repeated(seconds, 3);
    }

    #[test]
    fn test_start_uses_median() {
        let (mut clock, _) = clock_with(&[Some(62), Some(63), Some(64)], 600);

        assert!(clock.wait_for_start(Duration::from_secs(60)));

        assert_eq!(clock.phase(), ClockPhase::Started);
        assert_eq!(clock.state().start_offset, 63);
        assert_eq!(clock.estimated_time(), 63);
    }

    #[test]
    fn test_estimate_before_start_is_zero() {
        let (clock, wall) = clock_with(&[], 600);
        wall.advance(Duration::from_secs(100));
        assert_eq!(clock.estimated_time(), 0);
        assert_eq!(clock.formatted(), "0:00");
    }

    #[test]
    fn test_loading_screen_ignored() {
        let (mut clock, _) = clock_with(
            &[Some(0), Some(0), Some(1), Some(5), Some(5), Some(6)],
            600,
        );

        assert_eq!(clock.poll_start(), StartProbe::Loading(0));
        assert_eq!(clock.phase(), ClockPhase::NotStarted);
        assert_eq!(clock.poll_start(), StartProbe::Started(5));
    }

    #[test]
    fn test_wait_for_start_backs_off() {
        // One loading burst, one empty burst, then a start
        let (mut clock, wall) = clock_with(
            &[Some(1), Some(1), Some(1), None, None, None, Some(10), Some(10), Some(10)],
            600,
        );

        assert!(clock.wait_for_start(Duration::from_secs(60)));

        // 3 bursts of 0.4s, 3s loading back-off, 2s poll interval
        assert_eq!(wall.now(), Duration::from_millis(400 * 3 + 3000 + 2000));
        assert_eq!(clock.state().start_offset, 10);
    }

    #[test]
    fn test_wait_for_start_times_out() {
        let (mut clock, wall) = clock_with(&[], 600);

        assert!(!clock.wait_for_start(Duration::from_secs(10)));

        assert_eq!(clock.phase(), ClockPhase::NotStarted);
        assert!(wall.now() >= Duration::from_secs(10));
    }

    #[test]
    fn test_wait_for_start_cancelled() {
        let stop = StopSignal::new();
        let (clock, _) = clock_with(&[], 600);
        let mut clock = clock.with_stop_signal(stop.clone());
        stop.stop();

        assert!(!clock.wait_for_start(Duration::from_secs(60)));
        assert_eq!(clock.phase(), ClockPhase::NotStarted);
    }

    #[test]
    fn test_estimate_tracks_wall_time() {
        let (clock, wall) = started_at(63, 600);

        wall.advance(Duration::from_millis(2500));
        assert_eq!(clock.estimated_time(), 65);

        wall.advance(Duration::from_millis(500));
        assert_eq!(clock.estimated_time(), 66);
        assert_eq!(clock.formatted(), "1:06");
    }

    #[test]
    fn test_estimate_with_speed_multiplier() {
        let (clock, wall) = clock_with(&[Some(20); 3], 600);
        let config = ClockConfig {
            speed_multiplier: 1.5,
            ..ClockConfig::default()
        };
        let mut clock = clock.with_config(config, SamplingConfig::default());
        clock.poll_start();

        wall.advance(Duration::from_secs(10));
        assert_eq!(clock.estimated_time(), 35);
    }

    #[test]
    fn test_validate_recalibrates_on_drift() {
        let (mut clock, _) = started_at(100, 600);
        assert_eq!(clock.estimated_time(), 100);
        push_burst(&mut clock, 106);

        let check = clock.validate();

        assert_eq!(check, SyncCheck { valid: false, drift: Some(6) });
        assert!(check.recalibrated());
        assert_eq!(clock.state().start_offset, 106);
        assert_eq!(clock.estimated_time(), 106);
    }

    #[test]
    fn test_validate_within_threshold() {
        let (mut clock, wall) = started_at(100, 600);
        wall.advance(Duration::from_secs(10));
        push_burst(&mut clock, 113);

        let check = clock.validate();

        assert_eq!(check, SyncCheck { valid: true, drift: Some(3) });
        assert_eq!(clock.state().start_offset, 100);
    }

    #[test]
    fn test_validate_without_quorum() {
        let (mut clock, _) = started_at(100, 600);
        clock.source.push(Some(150));

        let check = clock.validate();

        assert_eq!(check, SyncCheck { valid: true, drift: None });
        assert_eq!(clock.state().start_offset, 100);
    }

    #[test]
    fn test_validate_before_start_does_not_sample() {
        let (mut clock, _) = clock_with(&[Some(50); 3], 600);

        assert_eq!(clock.validate(), SyncCheck { valid: true, drift: None });
        assert_eq!(clock.source.remaining(), 3);
    }

    #[test]
    fn test_end_detected_by_timer() {
        let (mut clock, wall) = started_at(100, 300);

        // Far from the end: no sampling
        assert!(!clock.check_ended());
        assert_eq!(clock.source.remaining(), 0);

        wall.advance(Duration::from_secs(180));
        push_burst(&mut clock, 290);
        assert!(!clock.check_ended());

        wall.advance(Duration::from_secs(10));
        push_burst(&mut clock, 295);
        assert!(clock.check_ended());
        assert_eq!(clock.phase(), ClockPhase::Ended);

        // Stays ended without sampling again
        assert!(clock.check_ended());
        assert_eq!(clock.source.remaining(), 0);
    }

    #[test]
    fn test_end_fallback() {
        let (mut clock, wall) = started_at(100, 300);

        wall.advance(Duration::from_secs(229));
        assert!(!clock.check_ended());

        wall.advance(Duration::from_secs(1));
        assert!(clock.check_ended());
    }

    #[test]
    fn test_should_validate_now() {
        let (mut clock, wall) = clock_with(&[Some(30); 3], 600);
        let interval = Duration::from_secs(15);
        assert!(!clock.should_validate_now(interval));

        clock.poll_start();
        assert!(!clock.should_validate_now(interval));

        wall.advance(Duration::from_secs(15));
        assert!(clock.should_validate_now(interval));

        push_burst(&mut clock, 45);
        clock.validate();
        assert!(!clock.should_validate_now(interval));
    }

    #[test]
    fn test_phase_order() {
        assert!(ClockPhase::NotStarted < ClockPhase::Started);
        assert!(ClockPhase::Started < ClockPhase::Ended);
        assert_eq!(ClockPhase::NotStarted.to_string(), "not started");
    }
}
