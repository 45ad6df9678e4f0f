//! Camera script compilation.
//!
//! Turns a prioritized timeline into a time-sorted list of camera shots:
//! fixed opening shots, an arrival jump per located moment, and player
//! overviews filling the quiet stretches between moments.

use tracing::{debug, info};

use cast_events::{GameSeconds, Location, PriorityClass};

use crate::config::ScriptConfig;
use crate::output::{CameraShot, PlayerSlot, ScriptDocument, ShotAction, StatPanel};
use crate::prioritizer::{MomentKind, PrioritizedEvent};

/// Compiles prioritized timelines into camera scripts.
#[derive(Debug, Clone, Default)]
pub struct ScriptGenerator {
    config: ScriptConfig,
}

impl ScriptGenerator {
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    /// Compiles the shot list for a replay of `duration` seconds.
    ///
    /// The result is sorted by time; shots sharing a time keep the order
    /// they were produced in.
    pub fn generate(&self, timeline: &[PrioritizedEvent], duration: GameSeconds) -> Vec<CameraShot> {
        let mut shots = opening_shots();

        for event in timeline {
            self.push_event_shots(event, &mut shots);
        }
        self.push_overview_shots(timeline, duration, &mut shots);

        shots.sort_by_key(|s| s.time);

        info!(
            "Generated {} camera shots from {} moments",
            shots.len(),
            timeline.len()
        );
        shots
    }

    /// Compiles the shot list and wraps it in a script document.
    pub fn generate_document(
        &self,
        timeline: &[PrioritizedEvent],
        duration: GameSeconds,
    ) -> ScriptDocument {
        ScriptDocument::new(duration, self.generate(timeline, duration))
    }

    fn push_event_shots(&self, event: &PrioritizedEvent, shots: &mut Vec<CameraShot>) {
        let Some(location) = event.location else {
            return;
        };
        let arrival = event
            .time
            .saturating_sub(self.config.arrival_buffer)
            .max(self.config.min_arrival);

        shots.push(CameraShot::new(
            arrival,
            ShotAction::minimap_jump(location.x, location.y, jump_description(event.kind, location)),
        ));

        match event.kind {
            MomentKind::Battle if event.priority >= PriorityClass::Medium => {
                shots.push(CameraShot::new(
                    event.time,
                    ShotAction::stat_panel(StatPanel::ArmyValue),
                ));
            }
            MomentKind::Expansion => {
                shots.push(CameraShot::new(
                    event.time.saturating_add(2),
                    ShotAction::stat_panel(StatPanel::Income),
                ));
            }
            MomentKind::Battle | MomentKind::Tech => {}
        }
    }

    fn push_overview_shots(
        &self,
        timeline: &[PrioritizedEvent],
        duration: GameSeconds,
        shots: &mut Vec<CameraShot>,
    ) {
        let mut times: Vec<GameSeconds> = timeline.iter().map(|e| e.time).collect();
        times.sort_unstable();

        let mut player = PlayerSlot::ONE;
        let mut last = 0;

        for time in times {
            let gap = time - last;
            if gap >= self.config.min_gap {
                let at = last + gap / 2;
                debug!("Overview of player {} at {}s fills {}s gap", player, at, gap);
                shots.push(CameraShot::new(at, ShotAction::player_view(player)));
                player = player.opponent();
            }
            last = time;
        }

        if duration.saturating_sub(last) >= self.config.min_gap {
            let at = last.saturating_add(self.config.tail_offset);
            if at.saturating_add(self.config.tail_margin) <= duration {
                shots.push(CameraShot::new(at, ShotAction::player_view(player)));
            }
        }
    }
}

fn opening_shots() -> Vec<CameraShot> {
    vec![
        CameraShot::new(5, ShotAction::player_view(PlayerSlot::ONE)),
        CameraShot::new(15, ShotAction::stat_panel(StatPanel::Income)),
        CameraShot::new(25, ShotAction::player_view(PlayerSlot::TWO)),
    ]
}

fn jump_description(kind: MomentKind, location: Location) -> String {
    match kind {
        MomentKind::Battle => format!("Move to battle @ {}", location),
        MomentKind::Expansion => format!("Expansion @ {}", location),
        MomentKind::Tech => format!("Tech building @ {}", location),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moment(time: GameSeconds, kind: MomentKind, priority: PriorityClass) -> PrioritizedEvent {
        PrioritizedEvent {
            time,
            kind,
            description: String::new(),
            location: Some(Location::new(100, 80)),
            priority,
            score: 0,
            duration: 5,
        }
    }

    fn times(shots: &[CameraShot]) -> Vec<GameSeconds> {
        shots.iter().map(|s| s.time).collect()
    }

    #[test]
    fn test_opening_shots_always_present() {
        let generator = ScriptGenerator::default();

        for duration in [0, 10, 30, 300, 3600] {
            let shots = generator.generate(&[], duration);
            for expected in opening_shots() {
                assert!(shots.contains(&expected), "missing {} for {}s", expected, duration);
            }
            assert_eq!(shots[0], CameraShot::new(5, ShotAction::player_view(PlayerSlot::ONE)));
        }
    }

    #[test]
    fn test_empty_timeline_tail() {
        let generator = ScriptGenerator::default();

        // Tail lands at 10s, needs 10 + 5 <= duration
        assert_eq!(times(&generator.generate(&[], 300)), vec![5, 10, 15, 25]);
        assert_eq!(times(&generator.generate(&[], 15)), vec![5, 15, 25]);
        assert_eq!(times(&generator.generate(&[], 20)), vec![5, 10, 15, 25]);
    }

    #[test]
    fn test_high_battle_shots() {
        let generator = ScriptGenerator::default();
        let shots = generator.generate(&[moment(235, MomentKind::Battle, PriorityClass::High)], 245);

        let jump = shots.iter().find(|s| s.time == 232).unwrap();
        assert_eq!(
            jump.action,
            ShotAction::minimap_jump(100, 80, "Move to battle @ (100, 80)")
        );
        let panel = shots.iter().find(|s| s.time == 235).unwrap();
        assert_eq!(panel.action, ShotAction::stat_panel(StatPanel::ArmyValue));
    }

    #[test]
    fn test_low_battle_has_no_panel() {
        let generator = ScriptGenerator::default();
        let shots = generator.generate(&[moment(107, MomentKind::Battle, PriorityClass::Low)], 110);

        assert!(!shots
            .iter()
            .any(|s| s.action == ShotAction::stat_panel(StatPanel::ArmyValue)));
        assert!(shots.iter().any(|s| s.time == 104));
    }

    #[test]
    fn test_expansion_and_tech_shots() {
        let generator = ScriptGenerator::default();
        let timeline = vec![
            moment(58, MomentKind::Expansion, PriorityClass::High),
            moment(70, MomentKind::Tech, PriorityClass::Medium),
        ];
        let shots = generator.generate(&timeline, 80);

        let income = shots.iter().find(|s| s.time == 60).unwrap();
        assert_eq!(income.action, ShotAction::stat_panel(StatPanel::Income));
        let tech = shots.iter().find(|s| s.time == 67).unwrap();
        assert_eq!(
            tech.action,
            ShotAction::minimap_jump(100, 80, "Tech building @ (100, 80)")
        );
    }

    #[test]
    fn test_arrival_clamped() {
        let generator = ScriptGenerator::default();
        let shots = generator.generate(&[moment(2, MomentKind::Tech, PriorityClass::Medium)], 10);

        let jumps: Vec<_> = shots
            .iter()
            .filter(|s| matches!(s.action, ShotAction::MinimapJump { .. }))
            .collect();
        assert_eq!(jumps.len(), 1);
        assert_eq!(jumps[0].time, 5);
    }

    #[test]
    fn test_unlocated_moment_only_counts_for_gaps() {
        let mut event = moment(60, MomentKind::Battle, PriorityClass::High);
        event.location = None;

        let shots = ScriptGenerator::default().generate(&[event], 70);

        // Opening plus the overview at 30
        assert_eq!(times(&shots), vec![5, 15, 25, 30]);
    }

    #[test]
    fn test_gap_overviews_alternate() {
        let timeline = vec![
            moment(40, MomentKind::Tech, PriorityClass::Medium),
            moment(50, MomentKind::Tech, PriorityClass::Medium),
            moment(90, MomentKind::Tech, PriorityClass::Medium),
            moment(120, MomentKind::Tech, PriorityClass::Medium),
        ];
        let shots = ScriptGenerator::default().generate(&timeline, 125);

        let overviews: Vec<_> = shots
            .iter()
            .filter_map(|s| match s.action {
                ShotAction::PlayerView { player } => Some((s.time, player.get())),
                _ => None,
            })
            .collect();
        // Openings at 5 and 25 plus gaps 0..40 -> 20, 50..90 -> 70, 90..120 -> 105;
        // no tail with 5s left
        assert_eq!(overviews, vec![(5, 1), (20, 1), (25, 2), (70, 2), (105, 1)]);
    }

    #[test]
    fn test_tail_overview() {
        let timeline = vec![moment(100, MomentKind::Tech, PriorityClass::Medium)];
        let generator = ScriptGenerator::default();

        // Gap overview at 50 uses player 1, tail at 110 uses player 2
        let shots = generator.generate(&timeline, 200);
        let tail = shots.last().unwrap();
        assert_eq!(tail.time, 110);
        assert_eq!(tail.action, ShotAction::player_view(PlayerSlot::TWO));

        // 110 + 5 <= 115 still fits
        let shots = generator.generate(&timeline, 120);
        assert_eq!(shots.last().unwrap().time, 110);

        // 19s remaining is below the minimum gap
        let shots = generator.generate(&timeline, 119);
        assert_eq!(shots.last().unwrap().time, 97);
    }

    #[test]
    fn test_sorted_and_stable() {
        let timeline = vec![
            moment(28, MomentKind::Battle, PriorityClass::High),
            moment(28, MomentKind::Expansion, PriorityClass::High),
        ];
        let shots = ScriptGenerator::default().generate(&timeline, 40);

        assert!(shots.windows(2).all(|w| w[0].time <= w[1].time));
        let at_25: Vec<_> = shots.iter().filter(|s| s.time == 25).map(|s| s.action.kind_name()).collect();
        // Opening shot first, then the two arrival jumps in timeline order
        assert_eq!(at_25, vec!["player_view", "minimap_jump", "minimap_jump"]);
    }

    #[test]
    fn test_custom_config() {
        let config = ScriptConfig {
            arrival_buffer: 10,
            min_gap: 1000,
            ..ScriptConfig::default()
        };
        let generator = ScriptGenerator::new(config);
        let shots = generator.generate(&[moment(100, MomentKind::Tech, PriorityClass::Medium)], 500);

        assert_eq!(times(&shots), vec![5, 15, 25, 90]);
    }

    #[test]
    fn test_generate_document() {
        let doc = ScriptGenerator::default().generate_document(&[], 300);
        assert_eq!(doc.duration, 300);
        assert_eq!(doc.total_shots, doc.shots.len());
        assert_eq!(doc.executed_count(), 0);
    }
}
