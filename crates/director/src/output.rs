//! Camera shots and exchanged documents.
//!
//! Contains the camera shot types compiled by the script generator, the
//! timeline and script documents exchanged as JSON, and file I/O for
//! writing and reading them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use cast_events::{deserialize_flexible_seconds, GameSeconds};

use crate::battles::Battle;
use crate::prioritizer::{PrioritizationSummary, PrioritizedEvent};

/// File name of the timeline document inside an output directory.
pub const TIMELINE_FILE: &str = "timeline.json";
/// File name of the script document inside an output directory.
pub const SCRIPT_FILE: &str = "camera_script.json";

/// Observer slot of a player, `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerSlot(u8);

impl PlayerSlot {
    pub const ONE: PlayerSlot = PlayerSlot(1);
    pub const TWO: PlayerSlot = PlayerSlot(2);

    /// Returns a slot if `n` is in `1..=8`.
    pub fn new(n: u8) -> Option<Self> {
        (1..=8).contains(&n).then_some(Self(n))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The other player of a 1v1.
    pub fn opponent(self) -> Self {
        if self == Self::ONE {
            Self::TWO
        } else {
            Self::ONE
        }
    }
}

/// A player number outside `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("player must be in 1..=8, got {0}")]
pub struct InvalidPlayer(pub u8);

impl TryFrom<u8> for PlayerSlot {
    type Error = InvalidPlayer;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(n).ok_or(InvalidPlayer(n))
    }
}

impl From<PlayerSlot> for u8 {
    fn from(slot: PlayerSlot) -> u8 {
        slot.0
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Statistics comparison panels of the replay observer UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatPanel {
    ArmyValue,
    Production,
    Income,
    UnitsLost,
    Apm,
    Epm,
    Resources,
    Spending,
    Units,
    Buildings,
    Upgrades,
    Close,
}

impl StatPanel {
    /// Observer hotkey that opens the panel.
    pub fn hotkey(self) -> &'static str {
        match self {
            StatPanel::ArmyValue => "A",
            StatPanel::Production => "D",
            StatPanel::Income => "I",
            StatPanel::UnitsLost => "L",
            StatPanel::Apm => "M",
            StatPanel::Epm => "shift+C",
            StatPanel::Resources => "R",
            StatPanel::Spending => "S",
            StatPanel::Units => "U",
            StatPanel::Buildings => "T",
            StatPanel::Upgrades => "G",
            StatPanel::Close => "N",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatPanel::ArmyValue => "Army Value",
            StatPanel::Production => "Production",
            StatPanel::Income => "Income",
            StatPanel::UnitsLost => "Units Lost",
            StatPanel::Apm => "APM",
            StatPanel::Epm => "EPM",
            StatPanel::Resources => "Resources",
            StatPanel::Spending => "Spending",
            StatPanel::Units => "Units",
            StatPanel::Buildings => "Buildings",
            StatPanel::Upgrades => "Upgrades",
            StatPanel::Close => "Close Panel",
        }
    }

    pub fn all() -> &'static [StatPanel] {
        &[
            StatPanel::ArmyValue,
            StatPanel::Production,
            StatPanel::Income,
            StatPanel::UnitsLost,
            StatPanel::Apm,
            StatPanel::Epm,
            StatPanel::Resources,
            StatPanel::Spending,
            StatPanel::Units,
            StatPanel::Buildings,
            StatPanel::Upgrades,
            StatPanel::Close,
        ]
    }
}

/// Toggleable 1v1 UI panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiPanel {
    NamePanel,
    ResourcesPanel,
    ArmySupplyPanel,
    UnitsKilledPanel,
    ApmPanel,
    HideAllUi,
}

impl UiPanel {
    /// Observer hotkey that toggles the panel.
    pub fn hotkey(self) -> &'static str {
        match self {
            UiPanel::NamePanel => "ctrl+n",
            UiPanel::ResourcesPanel => "ctrl+i",
            UiPanel::ArmySupplyPanel => "ctrl+a",
            UiPanel::UnitsKilledPanel => "ctrl+r",
            UiPanel::ApmPanel => "ctrl+v",
            UiPanel::HideAllUi => "ctrl+w",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UiPanel::NamePanel => "Name Panel",
            UiPanel::ResourcesPanel => "Resources Panel",
            UiPanel::ArmySupplyPanel => "Army/Supply Panel",
            UiPanel::UnitsKilledPanel => "Units Killed Panel",
            UiPanel::ApmPanel => "APM Panel",
            UiPanel::HideAllUi => "All UI",
        }
    }
}

/// What a shot does when it fires.
///
/// Serialized adjacently tagged: `{"kind": "player_view", "params": {"player": 1}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum ShotAction {
    /// Switch to a player's perspective
    PlayerView { player: PlayerSlot },
    /// Click the minimap at a game position
    MinimapJump {
        x: i32,
        y: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Open a statistics comparison panel
    StatPanel { panel: StatPanel },
    /// Toggle a UI panel
    UiPanel { panel: UiPanel },
    /// Follow the selected unit
    FollowUnit {
        #[serde(default)]
        hold: bool,
    },
}

impl ShotAction {
    /// Creates a PlayerView action.
    pub fn player_view(player: PlayerSlot) -> Self {
        Self::PlayerView { player }
    }

    /// Creates a MinimapJump action.
    pub fn minimap_jump(x: i32, y: i32, description: impl Into<String>) -> Self {
        Self::MinimapJump {
            x,
            y,
            description: Some(description.into()),
        }
    }

    /// Creates a StatPanel action.
    pub fn stat_panel(panel: StatPanel) -> Self {
        Self::StatPanel { panel }
    }

    /// Wire name of the action kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ShotAction::PlayerView { .. } => "player_view",
            ShotAction::MinimapJump { .. } => "minimap_jump",
            ShotAction::StatPanel { .. } => "stat_panel",
            ShotAction::UiPanel { .. } => "ui_panel",
            ShotAction::FollowUnit { .. } => "follow_unit",
        }
    }

    /// Short human-readable parameter list.
    pub fn params_summary(&self) -> String {
        match self {
            ShotAction::PlayerView { player } => format!("player={}", player),
            ShotAction::MinimapJump { x, y, description } => match description {
                Some(d) => format!("x={} y={} \"{}\"", x, y, d),
                None => format!("x={} y={}", x, y),
            },
            ShotAction::StatPanel { panel } => format!("panel={}", panel.label()),
            ShotAction::UiPanel { panel } => format!("panel={}", panel.label()),
            ShotAction::FollowUnit { hold } => format!("hold={}", hold),
        }
    }
}

/// A single scheduled camera directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraShot {
    /// Game time to fire at; accepts seconds or `"M:SS"` on input
    #[serde(deserialize_with = "deserialize_flexible_seconds")]
    pub time: GameSeconds,
    #[serde(flatten)]
    pub action: ShotAction,
    /// Set once the shot has been dispatched; never cleared
    #[serde(default)]
    pub executed: bool,
}

impl CameraShot {
    /// Creates an unexecuted shot.
    pub fn new(time: GameSeconds, action: ShotAction) -> Self {
        Self {
            time,
            action,
            executed: false,
        }
    }
}

impl fmt::Display for CameraShot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02} {} {}",
            self.time / 60,
            self.time % 60,
            self.action.kind_name(),
            self.action.params_summary()
        )
    }
}

/// The prioritized timeline as exchanged on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDocument {
    pub summary: PrioritizationSummary,
    pub events: Vec<PrioritizedEvent>,
    pub battles: Vec<Battle>,
}

/// The compiled shot list as exchanged on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDocument {
    /// Replay length in seconds
    #[serde(deserialize_with = "deserialize_flexible_seconds")]
    pub duration: GameSeconds,
    /// Informational; recomputed on load
    #[serde(default)]
    pub total_shots: usize,
    pub shots: Vec<CameraShot>,
}

impl ScriptDocument {
    /// Creates a document from a shot list.
    pub fn new(duration: GameSeconds, shots: Vec<CameraShot>) -> Self {
        Self {
            duration,
            total_shots: shots.len(),
            shots,
        }
    }

    /// Parses and normalizes a script document.
    ///
    /// Shots are stably sorted by time. Unknown kinds or panels, players
    /// outside `1..=8` and malformed times are rejected.
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let mut doc: ScriptDocument = serde_json::from_str(json)?;
        doc.shots.sort_by_key(|s| s.time);
        doc.total_shots = doc.shots.len();
        Ok(doc)
    }

    /// Loads a script document from a file.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Serializes the document to pretty JSON.
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of shots already marked executed.
    pub fn executed_count(&self) -> usize {
        self.shots.iter().filter(|s| s.executed).count()
    }
}

/// Errors that can occur while loading a camera script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file could not be read
    #[error("failed to read script {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The script is not a valid script document
    #[error("invalid camera script: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Errors that can occur during output operations.
#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes timeline and script documents into an output directory.
///
/// # Output Files
///
/// - `timeline.json` - summary, prioritized events and battles
/// - `camera_script.json` - the compiled shot list
#[derive(Debug)]
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    /// Creates a writer, creating the directory if it doesn't exist.
    pub fn new(output_dir: &Path) -> Result<Self, OutputError> {
        fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Writes the timeline document and returns its path.
    pub fn write_timeline(&self, timeline: &TimelineDocument) -> Result<PathBuf, OutputError> {
        let path = self.output_dir.join(TIMELINE_FILE);
        write_pretty(&path, timeline)?;
        Ok(path)
    }

    /// Writes the script document and returns its path.
    pub fn write_script(&self, script: &ScriptDocument) -> Result<PathBuf, OutputError> {
        let path = self.output_dir.join(SCRIPT_FILE);
        write_pretty(&path, script)?;
        Ok(path)
    }

    /// Returns the output directory path.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Reads documents back from an output directory.
#[derive(Debug)]
pub struct OutputReader {
    output_dir: PathBuf,
}

impl OutputReader {
    /// Creates a reader for the given directory.
    pub fn from_dir(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Reads the timeline document.
    pub fn read_timeline(&self) -> Result<TimelineDocument, OutputError> {
        let content = fs::read_to_string(self.output_dir.join(TIMELINE_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Reads and validates the script document.
    pub fn read_script(&self) -> Result<ScriptDocument, ScriptError> {
        ScriptDocument::load(&self.output_dir.join(SCRIPT_FILE))
    }
}
