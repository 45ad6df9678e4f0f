//! The live polling loop.
//!
//! Waits for the replay to start, then repeatedly estimates game time,
//! fires due shots, re-checks the clock on a cadence and sleeps. Runs on the
//! calling thread until the replay ends or the stop signal fires.

use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use cast_events::{format_game_time, GameSeconds};

use crate::camera::{CameraActuator, CameraDirector};
use crate::clock::GameClock;
use crate::config::{DirectorConfig, SessionConfig};
use crate::output::ScriptDocument;
use crate::timesource::TimeSource;
use crate::wallclock::{StopSignal, WallClock};

/// Summary of a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub started: bool,
    pub ended: bool,
    pub cancelled: bool,
    pub shots_executed: usize,
    pub shots_total: usize,
    pub validations: usize,
    pub recalibrations: usize,
    /// Last game time estimate
    pub final_time: GameSeconds,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.cancelled {
            "cancelled"
        } else if self.ended {
            "ended"
        } else if self.started {
            "stopped"
        } else {
            "never started"
        };
        write!(
            f,
            "{} at {}: {}/{} shots, {} validations, {} recalibrations",
            outcome,
            format_game_time(self.final_time),
            self.shots_executed,
            self.shots_total,
            self.validations,
            self.recalibrations
        )
    }
}

/// One recording session bound to a time source, wall clock and actuator.
#[derive(Debug)]
pub struct LiveSession<S, W, A> {
    clock: GameClock<S, W>,
    director: CameraDirector<A>,
    config: SessionConfig,
    stop: StopSignal,
}

impl<S: TimeSource, W: WallClock, A: CameraActuator> LiveSession<S, W, A> {
    /// Creates a session for a loaded script.
    pub fn new(script: ScriptDocument, source: S, wall: W, actuator: A, config: &DirectorConfig) -> Self {
        Self::with_stop_signal(script, source, wall, actuator, config, StopSignal::new())
    }

    /// Creates a session cancelled through an existing signal.
    pub fn with_stop_signal(
        script: ScriptDocument,
        source: S,
        wall: W,
        actuator: A,
        config: &DirectorConfig,
        stop: StopSignal,
    ) -> Self {
        let clock = GameClock::from_config(source, wall, script.duration, config)
            .with_stop_signal(stop.clone());
        let director = CameraDirector::from_document(script, actuator)
            .with_dispatch_delay(config.session.dispatch_delay());

        Self {
            clock,
            director,
            config: config.session.clone(),
            stop,
        }
    }

    /// A handle that cancels the session from another thread.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn clock(&self) -> &GameClock<S, W> {
        &self.clock
    }

    pub fn director(&self) -> &CameraDirector<A> {
        &self.director
    }

    /// Runs the session to completion.
    pub fn run(&mut self) -> SessionReport {
        let mut report = SessionReport::default();

        info!(
            "Waiting for replay start ({} shots, {} long)",
            self.director.shots().len(),
            format_game_time(self.clock.duration())
        );
        if !self.clock.wait_for_start(self.config.start_timeout()) {
            report.cancelled = self.stop.is_stopped();
            if !report.cancelled {
                warn!("Replay never started");
            }
            return self.finish(report);
        }
        report.started = true;

        let mut last_status = self.clock.wall().now();
        loop {
            if self.stop.is_stopped() {
                report.cancelled = true;
                break;
            }
            if self.clock.check_ended() {
                report.ended = true;
                break;
            }

            let now_game = self.clock.estimated_time();
            self.director.update_with(now_game, self.clock.wall());

            if self.clock.should_validate_now(self.config.validation_interval()) {
                let check = self.clock.validate();
                report.validations += 1;
                if check.recalibrated() {
                    report.recalibrations += 1;
                }
            }

            let now = self.clock.wall().now();
            if now.saturating_sub(last_status) >= self.config.status_interval() {
                info!("Game time {} - {}", self.clock.formatted(), self.director.progress());
                last_status = now;
            }

            if !self.stop.sleep(self.clock.wall(), self.config.poll_interval()) {
                report.cancelled = true;
                break;
            }
        }

        self.finish(report)
    }

    fn finish(&self, mut report: SessionReport) -> SessionReport {
        let progress = self.director.progress();
        report.shots_executed = progress.executed;
        report.shots_total = progress.total;
        report.final_time = self.clock.estimated_time();
        info!("Session {}", report);
        report
    }
}
