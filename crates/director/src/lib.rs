//! Director: replay event prioritization and camera scheduling.
//!
//! The director turns a replay's raw events into a broadcast camera script,
//! then plays that script back against a live replay whose clock is only
//! known through a noisy on-screen timer.
//!
//! # Architecture
//!
//! ```text
//!                      plan                                    run
//! ┌────────────┐  events.jsonl  ┌──────────┐  camera_script.json  ┌─────────────┐
//! │ cast-events│ ─────────────▶ │ director │ ───────────────────▶ │ LiveSession │
//! └────────────┘                └──────────┘                      └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`classifier`]: Keyword priority classes for raw events
//! - [`battles`]: Clustering army deaths into battles
//! - [`prioritizer`]: Scored timeline of battles, expansions and tech
//! - [`script`]: Compiling the timeline into camera shots
//! - [`output`]: Shot types, exchanged documents and file I/O
//! - [`clock`]: Game-time estimation against an external timer
//! - [`quorum`]: Quorum-median sampling shared by every clock check
//! - [`camera`]: Dispatching due shots to a camera actuator
//! - [`session`]: The live polling loop

pub mod battles;
pub mod camera;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod output;
pub mod prioritizer;
pub mod quorum;
pub mod script;
pub mod session;
pub mod timesource;
pub mod wallclock;

// Re-export pipeline types
pub use battles::{Battle, BattleClusterer, ClusterOutcome};
pub use classifier::{classify, classify_event};
pub use prioritizer::{
    EventPrioritizer, MinuteBucket, MomentKind, PrioritizationSummary, PrioritizedEvent,
    PriorityCounts,
};
pub use script::ScriptGenerator;

// Re-export output types
pub use output::{
    CameraShot, InvalidPlayer, OutputError, OutputReader, OutputWriter, PlayerSlot, ScriptDocument,
    ScriptError, ShotAction, StatPanel, TimelineDocument, UiPanel, SCRIPT_FILE, TIMELINE_FILE,
};

// Re-export config types
pub use config::{
    default_config_toml, ClockConfig, ClusteringConfig, ConfigError, DirectorConfig,
    SamplingConfig, ScriptConfig, SessionConfig, UnitValueTable,
};

// Re-export live playback types
pub use camera::{
    CameraActuator, CameraCommand, CameraDirector, LoggingActuator, MinimapGeometry, Progress,
    RecordingActuator,
};
pub use clock::{ClockPhase, ClockState, GameClock, StartProbe, SyncCheck};
pub use quorum::{sample_quorum, QuorumOutcome};
pub use session::{LiveSession, SessionReport};
pub use timesource::{FnTimeSource, ScriptedTimeSource, TimeSource, TimerFileSource, TimerReading};
pub use wallclock::{ManualClock, StopSignal, SystemClock, WallClock};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use cast_events::{load_events_or_synthesize, EventOrigin, GameSeconds, RawEvent, ReplayEventSource, SourceError};

/// Errors that can occur in Director operations.
#[derive(Debug, Error)]
pub enum DirectorError {
    /// Error loading configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Error loading replay events
    #[error("event source error: {0}")]
    Source(#[from] SourceError),
    /// Error writing documents
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    /// Error loading a camera script
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

/// Everything the planning pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub timeline: TimelineDocument,
    pub script: ScriptDocument,
}

/// Paths written by [`Director::write_plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanFiles {
    pub timeline: PathBuf,
    pub script: PathBuf,
}

/// Plans camera scripts from replay events.
///
/// Owns the prioritizer and script generator built from one configuration.
#[derive(Debug)]
pub struct Director {
    config: DirectorConfig,
    prioritizer: EventPrioritizer,
    generator: ScriptGenerator,
}

impl Director {
    /// Creates a Director with the given configuration.
    pub fn new(config: DirectorConfig) -> Result<Self, DirectorError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Creates a Director from a configuration file.
    pub fn from_config_file(path: &Path) -> Result<Self, DirectorError> {
        let config = DirectorConfig::from_file(path)?;
        Self::new(config)
    }

    /// Creates a Director with default configuration.
    pub fn with_defaults() -> Self {
        Self::build(DirectorConfig::default())
    }

    fn build(config: DirectorConfig) -> Self {
        Self {
            prioritizer: EventPrioritizer::from_config(&config),
            generator: ScriptGenerator::new(config.script.clone()),
            config,
        }
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// Prioritizes `events` and compiles the camera script.
    pub fn plan(&mut self, events: &[RawEvent], duration: GameSeconds) -> Plan {
        let timeline = self.prioritizer.process_events(events);
        let summary = self.prioritizer.summary();
        let script = self.generator.generate_document(&timeline, duration);

        info!(
            "Planned {} shots from {} moments ({} battles, {} dropped clusters)",
            script.total_shots, summary.total_events, summary.battles, summary.dropped_clusters
        );

        Plan {
            timeline: TimelineDocument {
                summary,
                events: timeline,
                battles: self.prioritizer.battles().to_vec(),
            },
            script,
        }
    }

    /// Loads events for `replay` and plans them.
    ///
    /// Falls back to synthetic events when the source does not support the
    /// replay's format.
    pub fn plan_replay(
        &mut self,
        source: &dyn ReplayEventSource,
        replay: &Path,
        duration: GameSeconds,
        players: &[String],
    ) -> Result<(Plan, EventOrigin), DirectorError> {
        let (events, origin) = load_events_or_synthesize(source, replay, duration, players)?;
        Ok((self.plan(&events, duration), origin))
    }

    /// Writes both plan documents into `output_dir`.
    pub fn write_plan(plan: &Plan, output_dir: &Path) -> Result<PlanFiles, DirectorError> {
        let writer = OutputWriter::new(output_dir)?;
        Ok(PlanFiles {
            timeline: writer.write_timeline(&plan.timeline)?,
            script: writer.write_script(&plan.script)?,
        })
    }
}

impl Default for Director {
    fn default() -> Self {
        Self::with_defaults()
    }
}
