//! Camera control during a live replay.
//!
//! [`CameraDirector`] walks a sorted shot list with a cursor that only moves
//! forward, handing each due shot to a [`CameraActuator`].

use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use cast_events::GameSeconds;

use crate::output::{CameraShot, PlayerSlot, ScriptDocument, ShotAction, StatPanel, UiPanel};
use crate::wallclock::{SystemClock, WallClock};

/// Receives camera directives. Fire-and-forget.
pub trait CameraActuator {
    fn switch_player(&mut self, player: PlayerSlot);
    fn jump_to(&mut self, x: i32, y: i32);
    fn show_stat_panel(&mut self, panel: StatPanel);
    fn toggle_ui_panel(&mut self, panel: UiPanel);
    fn follow_unit(&mut self, hold: bool);

    /// Routes a shot action to the matching directive.
    fn execute(&mut self, action: &ShotAction) {
        match action {
            ShotAction::PlayerView { player } => self.switch_player(*player),
            ShotAction::MinimapJump { x, y, .. } => self.jump_to(*x, *y),
            ShotAction::StatPanel { panel } => self.show_stat_panel(*panel),
            ShotAction::UiPanel { panel } => self.toggle_ui_panel(*panel),
            ShotAction::FollowUnit { hold } => self.follow_unit(*hold),
        }
    }
}

/// Projection of game coordinates onto the on-screen minimap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapGeometry {
    /// Screen pixel of the minimap's top-left corner
    pub origin: (i32, i32),
    /// Minimap size in pixels
    pub size: (i32, i32),
    /// Side length of the map in game units
    pub map_size: f64,
}

impl Default for MinimapGeometry {
    fn default() -> Self {
        Self {
            origin: (25, 810),
            size: (267, 256),
            map_size: 200.0,
        }
    }
}

impl MinimapGeometry {
    /// Screen pixel for a game position, truncated toward zero.
    pub fn to_pixel(&self, x: i32, y: i32) -> (i32, i32) {
        let px = (f64::from(x) / self.map_size * f64::from(self.size.0)) as i32;
        let py = (f64::from(y) / self.map_size * f64::from(self.size.1)) as i32;
        (self.origin.0 + px, self.origin.1 + py)
    }
}

/// Logs each directive with its observer hotkey or minimap pixel.
#[derive(Debug, Clone, Default)]
pub struct LoggingActuator {
    minimap: MinimapGeometry,
}

impl LoggingActuator {
    pub fn new(minimap: MinimapGeometry) -> Self {
        Self { minimap }
    }
}

impl CameraActuator for LoggingActuator {
    fn switch_player(&mut self, player: PlayerSlot) {
        info!("Camera: player {} view [f{}]", player, player.get());
    }

    fn jump_to(&mut self, x: i32, y: i32) {
        let (px, py) = self.minimap.to_pixel(x, y);
        info!("Camera: jump to ({}, {}) [minimap click {}, {}]", x, y, px, py);
    }

    fn show_stat_panel(&mut self, panel: StatPanel) {
        info!("Camera: {} panel [{}]", panel.label(), panel.hotkey());
    }

    fn toggle_ui_panel(&mut self, panel: UiPanel) {
        info!("Camera: toggle {} [{}]", panel.label(), panel.hotkey());
    }

    fn follow_unit(&mut self, hold: bool) {
        let hotkey = if hold { "ctrl+f" } else { "ctrl+shift+f" };
        info!("Camera: follow selected unit [{}]", hotkey);
    }
}

/// A directive as seen by [`RecordingActuator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCommand {
    SwitchPlayer(PlayerSlot),
    JumpTo(i32, i32),
    ShowStatPanel(StatPanel),
    ToggleUiPanel(UiPanel),
    FollowUnit(bool),
}

/// Records directives in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    commands: Vec<CameraCommand>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[CameraCommand] {
        &self.commands
    }
}

impl CameraActuator for RecordingActuator {
    fn switch_player(&mut self, player: PlayerSlot) {
        self.commands.push(CameraCommand::SwitchPlayer(player));
    }

    fn jump_to(&mut self, x: i32, y: i32) {
        self.commands.push(CameraCommand::JumpTo(x, y));
    }

    fn show_stat_panel(&mut self, panel: StatPanel) {
        self.commands.push(CameraCommand::ShowStatPanel(panel));
    }

    fn toggle_ui_panel(&mut self, panel: UiPanel) {
        self.commands.push(CameraCommand::ToggleUiPanel(panel));
    }

    fn follow_unit(&mut self, hold: bool) {
        self.commands.push(CameraCommand::FollowUnit(hold));
    }
}

/// Executed versus total shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub executed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.executed == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} shots executed", self.executed, self.total)
    }
}

/// Fires scheduled shots as game time reaches them.
#[derive(Debug)]
pub struct CameraDirector<A> {
    shots: Vec<CameraShot>,
    cursor: usize,
    actuator: A,
    dispatch_delay: Duration,
}

impl<A: CameraActuator> CameraDirector<A> {
    /// Creates a director; shots are stably sorted by time.
    pub fn new(mut shots: Vec<CameraShot>, actuator: A) -> Self {
        shots.sort_by_key(|s| s.time);
        Self {
            shots,
            cursor: 0,
            actuator,
            dispatch_delay: Duration::ZERO,
        }
    }

    /// Creates a director for a loaded script document.
    pub fn from_document(document: ScriptDocument, actuator: A) -> Self {
        Self::new(document.shots, actuator)
    }

    /// Pause after each dispatched shot so the game can react.
    pub fn with_dispatch_delay(mut self, delay: Duration) -> Self {
        self.dispatch_delay = delay;
        self
    }

    /// Fires every due shot, sleeping the dispatch delay on the system clock.
    pub fn update(&mut self, current_time: GameSeconds) -> usize {
        self.update_with(current_time, &SystemClock::new())
    }

    /// Fires every due shot, sleeping the dispatch delay on `wall`.
    ///
    /// Stops at the first shot still in the future. Shots already marked
    /// executed are passed over without dispatch. The cursor never moves
    /// back, so a backward jump in `current_time` only delays later shots.
    pub fn update_with<W: WallClock + ?Sized>(&mut self, current_time: GameSeconds, wall: &W) -> usize {
        let mut dispatched = 0;

        while let Some(shot) = self.shots.get_mut(self.cursor) {
            if shot.executed {
                debug!("Skipping already executed shot {}", shot);
                self.cursor += 1;
                continue;
            }
            if shot.time > current_time {
                break;
            }

            debug!("Dispatching {} at {}s", shot, current_time);
            self.actuator.execute(&shot.action);
            shot.executed = true;
            self.cursor += 1;
            dispatched += 1;

            if !self.dispatch_delay.is_zero() {
                wall.sleep(self.dispatch_delay);
            }
        }

        dispatched
    }

    pub fn progress(&self) -> Progress {
        Progress {
            executed: self.shots.iter().filter(|s| s.executed).count(),
            total: self.shots.len(),
        }
    }

    /// Index of the next shot to consider.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Time of the next pending shot, if any.
    pub fn next_shot_time(&self) -> Option<GameSeconds> {
        self.shots[self.cursor..]
            .iter()
            .find(|s| !s.executed)
            .map(|s| s.time)
    }

    pub fn shots(&self) -> &[CameraShot] {
        &self.shots
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Consumes the director, returning the shots with their executed flags.
    pub fn into_shots(self) -> Vec<CameraShot> {
        self.shots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallclock::ManualClock;

    fn shots() -> Vec<CameraShot> {
        vec![
            CameraShot::new(25, ShotAction::player_view(PlayerSlot::TWO)),
            CameraShot::new(5, ShotAction::player_view(PlayerSlot::ONE)),
            CameraShot::new(15, ShotAction::stat_panel(StatPanel::Income)),
            CameraShot::new(55, ShotAction::minimap_jump(60, 52, "Expansion @ (60, 52)")),
            CameraShot::new(60, ShotAction::FollowUnit { hold: false }),
        ]
    }

    fn director() -> CameraDirector<RecordingActuator> {
        CameraDirector::new(shots(), RecordingActuator::new())
    }

    #[test]
    fn test_minimap_projection() {
        let geometry = MinimapGeometry::default();
        assert_eq!(geometry.to_pixel(0, 0), (25, 810));
        assert_eq!(geometry.to_pixel(100, 100), (158, 938));
        assert_eq!(geometry.to_pixel(60, 52), (105, 876));
        assert_eq!(geometry.to_pixel(200, 200), (292, 1066));
    }

    #[test]
    fn test_update_fires_due_shots_in_order() {
        let mut director = director();

        assert_eq!(director.update(4), 0);
        assert_eq!(director.update(16), 2);
        assert_eq!(
            director.actuator().commands(),
            &[
                CameraCommand::SwitchPlayer(PlayerSlot::ONE),
                CameraCommand::ShowStatPanel(StatPanel::Income),
            ]
        );
        assert_eq!(director.progress(), Progress { executed: 2, total: 5 });
        assert_eq!(director.next_shot_time(), Some(25));
    }

    #[test]
    fn test_update_idempotent_at_same_time() {
        let mut director = director();

        assert_eq!(director.update(30), 3);
        assert_eq!(director.update(30), 0);
        assert_eq!(director.update(30), 0);
        assert_eq!(director.actuator().commands().len(), 3);
    }

    #[test]
    fn test_backward_time_stalls() {
        let mut director = director();
        director.update(20);
        let cursor = director.cursor();

        // Clock recalibrated backward
        assert_eq!(director.update(10), 0);
        assert_eq!(director.cursor(), cursor);

        assert_eq!(director.update(25), 1);
    }

    #[test]
    fn test_late_update_fires_everything_once() {
        let mut director = director();

        assert_eq!(director.update(1000), 5);
        assert!(director.progress().is_complete());
        assert_eq!(
            director.actuator().commands()[3..],
            [CameraCommand::JumpTo(60, 52), CameraCommand::FollowUnit(false)]
        );
        assert_eq!(director.next_shot_time(), None);
    }

    #[test]
    fn test_executed_shots_passed_over() {
        let mut shots = shots();
        shots[1].executed = true; // the 5s shot
        let mut director = CameraDirector::new(shots, RecordingActuator::new());

        assert_eq!(director.update(16), 1);
        assert_eq!(
            director.actuator().commands(),
            &[CameraCommand::ShowStatPanel(StatPanel::Income)]
        );
        assert_eq!(director.progress().executed, 2);
    }

    #[test]
    fn test_dispatch_delay_uses_wall_clock() {
        let wall = ManualClock::new();
        let mut director = director().with_dispatch_delay(Duration::from_millis(100));

        director.update_with(30, &wall);

        assert_eq!(wall.now(), Duration::from_millis(300));
    }

    #[test]
    fn test_execute_routes_actions() {
        let mut actuator = RecordingActuator::new();
        actuator.execute(&ShotAction::UiPanel { panel: UiPanel::HideAllUi });
        actuator.execute(&ShotAction::stat_panel(StatPanel::Epm));

        assert_eq!(
            actuator.commands(),
            &[
                CameraCommand::ToggleUiPanel(UiPanel::HideAllUi),
                CameraCommand::ShowStatPanel(StatPanel::Epm),
            ]
        );
    }

    #[test]
    fn test_progress_display() {
        let director = director();
        assert_eq!(director.progress().to_string(), "0/5 shots executed");
    }

    #[test]
    fn test_empty_script() {
        let mut director = CameraDirector::new(Vec::new(), LoggingActuator::default());
        assert_eq!(director.update(100), 0);
        assert!(director.progress().is_complete());
    }
}
