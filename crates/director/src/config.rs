//! Configuration loading for the Director.
//!
//! All tunables are loaded from a TOML configuration file. Every section is
//! optional; missing sections and keys fall back to their defaults.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Complete Director configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// Battle clustering windows and thresholds
    #[serde(default)]
    pub clustering: ClusteringConfig,
    /// Per-unit army value table
    #[serde(default)]
    pub unit_values: UnitValueTable,
    /// Script compilation settings
    #[serde(default)]
    pub script: ScriptConfig,
    /// Game clock settings
    #[serde(default)]
    pub clock: ClockConfig,
    /// Quorum sampling settings
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Live session settings
    #[serde(default)]
    pub session: SessionConfig,
}

impl DirectorConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sampling;
        if s.samples == 0 {
            return Err(ConfigError::Invalid("sampling.samples must be at least 1".into()));
        }
        if s.quorum == 0 || s.quorum > s.samples {
            return Err(ConfigError::Invalid(format!(
                "sampling.quorum must be in 1..={}, got {}",
                s.samples, s.quorum
            )));
        }
        let speed = self.clock.speed_multiplier;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "clock.speed_multiplier must be positive and finite, got {}",
                speed
            )));
        }
        if self.clustering.min_deaths == 0 {
            return Err(ConfigError::Invalid("clustering.min_deaths must be at least 1".into()));
        }
        if self.clustering.space_window < 0.0 {
            return Err(ConfigError::Invalid("clustering.space_window must not be negative".into()));
        }
        if let Some((name, value)) = self
            .unit_values
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "unit_values.{} must be finite and not negative, got {}",
                name, value
            )));
        }
        Ok(())
    }
}

/// Battle clustering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Maximum seconds between consecutive deaths in one battle
    pub time_window: u32,
    /// Maximum map distance between consecutive deaths in one battle
    pub space_window: f64,
    /// Minimum deaths for a cluster to count as a battle
    pub min_deaths: usize,
    /// Value lost at or above which a battle is high priority
    pub high_value: f32,
    /// Death count at or above which a battle is high priority
    pub high_count: usize,
    /// Value lost at or above which a battle is medium priority
    pub medium_value: f32,
    /// Death count at or above which a battle is medium priority
    pub medium_count: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            time_window: 30,
            space_window: 20.0,
            min_deaths: 3,
            high_value: 20.0,
            high_count: 15,
            medium_value: 10.0,
            medium_count: 8,
        }
    }
}

/// Army value per unit type, keyed by lowercase unit name.
///
/// Entries from a config file are merged over the built-in table, so a file
/// only needs to list the units it changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UnitValueTable(BTreeMap<String, f32>);

const DEFAULT_UNIT_VALUES: &[(&str, f32)] = &[
    // Terran
    ("marine", 1.0),
    ("marauder", 2.0),
    ("reaper", 1.0),
    ("hellion", 2.0),
    ("hellbat", 2.0),
    ("siegetank", 3.0),
    ("thor", 6.0),
    ("viking", 2.0),
    ("medivac", 2.0),
    ("liberator", 3.0),
    ("banshee", 3.0),
    ("raven", 2.0),
    ("battlecruiser", 6.0),
    ("ghost", 2.0),
    // Protoss
    ("zealot", 2.0),
    ("stalker", 2.0),
    ("sentry", 2.0),
    ("adept", 2.0),
    ("hightemplar", 2.0),
    ("darktemplar", 2.0),
    ("archon", 4.0),
    ("immortal", 4.0),
    ("colossus", 6.0),
    ("disruptor", 3.0),
    ("phoenix", 2.0),
    ("voidray", 4.0),
    ("oracle", 3.0),
    ("tempest", 5.0),
    ("carrier", 6.0),
    ("mothership", 8.0),
    ("observer", 1.0),
    ("warpprism", 2.0),
    // Zerg
    ("zergling", 0.5),
    ("baneling", 0.5),
    ("roach", 2.0),
    ("ravager", 3.0),
    ("hydralisk", 2.0),
    ("lurker", 3.0),
    ("infestor", 2.0),
    ("swarmhost", 3.0),
    ("ultralisk", 6.0),
    ("mutalisk", 2.0),
    ("corruptor", 2.0),
    ("viper", 3.0),
    ("broodlord", 4.0),
    ("queen", 2.0),
    ("overlord", 0.0),
    // Workers
    ("scv", 0.0),
    ("probe", 0.0),
    ("drone", 0.0),
    // Noise
    ("larva", 0.0),
    ("egg", 0.0),
    ("mineralfield", 0.0),
    ("mineralfield750", 0.0),
    ("labmineralfield", 0.0),
    ("labmineralfield750", 0.0),
];

impl UnitValueTable {
    /// Value assumed for units missing from the table.
    pub const UNKNOWN_VALUE: f32 = 1.0;

    /// Creates an empty table.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets the value for a unit (name is lowercased).
    pub fn insert(&mut self, name: &str, value: f32) {
        self.0.insert(name.to_lowercase(), value);
    }

    /// Looks up a unit by case-insensitive exact name.
    pub fn get(&self, name: &str) -> Option<f32> {
        self.0.get(&name.to_lowercase()).copied()
    }

    /// Looks up a unit, falling back to [`Self::UNKNOWN_VALUE`].
    pub fn value_or_default(&self, name: &str) -> f32 {
        self.get(name).unwrap_or(Self::UNKNOWN_VALUE)
    }

    /// True when the unit is listed with a positive value.
    pub fn is_army_unit(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| v > 0.0)
    }

    /// Iterates over all entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for UnitValueTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (name, value) in DEFAULT_UNIT_VALUES {
            table.insert(name, *value);
        }
        table
    }
}

impl<'de> Deserialize<'de> for UnitValueTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let overrides = BTreeMap::<String, f32>::deserialize(deserializer)?;
        let mut table = Self::default();
        for (name, value) in overrides {
            table.insert(&name, value);
        }
        Ok(table)
    }
}

/// Script compilation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Seconds before an event to jump the camera there
    pub arrival_buffer: u32,
    /// Earliest time an arrival jump may be scheduled
    pub min_arrival: u32,
    /// Minimum quiet gap that earns an overview shot
    pub min_gap: u32,
    /// Seconds after the last event for the closing overview
    pub tail_offset: u32,
    /// The closing overview must land at least this long before the end
    pub tail_margin: u32,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            arrival_buffer: 3,
            min_arrival: 5,
            min_gap: 20,
            tail_offset: 10,
            tail_margin: 5,
        }
    }
}

/// Game clock configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Replay playback speed (1.0 = normal)
    pub speed_multiplier: f64,
    /// Drift above this many seconds triggers recalibration
    pub drift_threshold: u32,
    /// Readings below this are treated as loading-screen noise
    pub min_start_reading: u32,
    /// Back-off after a loading-screen reading
    pub loading_backoff_ms: u64,
    /// Wait between start-detection attempts without quorum
    pub start_poll_interval_ms: u64,
    /// End detection starts sampling this many seconds before the end
    pub end_window: u32,
    /// A reading within this many seconds of the end means ended
    pub end_margin: u32,
    /// Force the end this many seconds past the duration
    pub end_fallback: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            drift_threshold: 3,
            min_start_reading: 3,
            loading_backoff_ms: 3000,
            start_poll_interval_ms: 2000,
            end_window: 30,
            end_margin: 5,
            end_fallback: 30,
        }
    }
}

impl ClockConfig {
    pub fn loading_backoff(&self) -> Duration {
        Duration::from_millis(self.loading_backoff_ms)
    }

    pub fn start_poll_interval(&self) -> Duration {
        Duration::from_millis(self.start_poll_interval_ms)
    }
}

/// Quorum sampling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Samples per batch
    pub samples: usize,
    /// Parseable samples required for a consensus
    pub quorum: usize,
    /// Wait between samples in a batch
    pub sample_interval_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            samples: 3,
            quorum: 2,
            sample_interval_ms: 200,
        }
    }
}

impl SamplingConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

/// Live session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sleep between loop iterations
    pub poll_interval_ms: u64,
    /// Wall time between clock validations
    pub validation_interval_ms: u64,
    /// Give up waiting for the replay to start after this long
    pub start_timeout_ms: u64,
    /// Pause before each dispatched shot
    pub dispatch_delay_ms: u64,
    /// Wall time between status log lines
    pub status_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            validation_interval_ms: 15_000,
            start_timeout_ms: 60_000,
            dispatch_delay_ms: 100,
            status_interval_ms: 5_000,
        }
    }
}

impl SessionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validation_interval(&self) -> Duration {
        Duration::from_millis(self.validation_interval_ms)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    pub fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Error serializing TOML config
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Parsed but unusable settings
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Generates a default configuration file content.
///
/// The unit value table is left out; values listed under `[unit_values]`
/// override the built-in table entry by entry.
pub fn default_config_toml() -> String {
    r#"# replaycast configuration

[clustering]
time_window = 30
space_window = 20.0
min_deaths = 3
high_value = 20.0
high_count = 15
medium_value = 10.0
medium_count = 8

# Overrides for the built-in army value table, e.g.
# [unit_values]
# zergling = 0.5
[unit_values]

[script]
arrival_buffer = 3
min_arrival = 5
min_gap = 20
tail_offset = 10
tail_margin = 5

[clock]
speed_multiplier = 1.0
drift_threshold = 3
min_start_reading = 3
loading_backoff_ms = 3000
start_poll_interval_ms = 2000
end_window = 30
end_margin = 5
end_fallback = 30

[sampling]
samples = 3
quorum = 2
sample_interval_ms = 200

[session]
poll_interval_ms = 500
validation_interval_ms = 15000
start_timeout_ms = 60000
dispatch_delay_ms = 100
status_interval_ms = 5000
"#
    .to_string()
}
