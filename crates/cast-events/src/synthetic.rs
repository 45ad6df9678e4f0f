//! Synthetic replay events.
//!
//! When a replay cannot be decoded, the pipeline still needs something to
//! schedule. [`SyntheticEventGenerator`] scripts a plausible two-player game
//! (expansions, tech, upgrades, skirmishes, major battles and base attacks)
//! as ordinary [`RawEvent`]s, so the rest of the pipeline runs unchanged.
//!
//! Generation is deterministic: the RNG seed is an FNV-1a hash of the game
//! duration and the player names.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::event::RawEvent;
use crate::timestamp::GameSeconds;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a seed over the duration and player names.
pub fn synthetic_seed(duration: GameSeconds, players: &[String]) -> u64 {
    let mut hash = FNV_OFFSET;
    let mut feed = |bytes: &[u8]| {
        for b in bytes {
            hash ^= u64::from(*b);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    };

    feed(&duration.to_le_bytes());
    for name in players {
        feed(name.as_bytes());
        feed(&[0]);
    }
    hash
}

/// Unit and structure names for one race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceRoster {
    pub name: &'static str,
    pub base: &'static str,
    pub worker: &'static str,
    pub tech: &'static [&'static str],
    pub army: &'static [&'static str],
    pub upgrades: &'static [&'static str],
}

pub const TERRAN: RaceRoster = RaceRoster {
    name: "terran",
    base: "CommandCenter",
    worker: "SCV",
    tech: &["Barracks", "Factory", "Starport", "FusionCore"],
    army: &["Marine", "Marine", "Marauder", "SiegeTank", "Medivac", "Hellion", "Thor"],
    upgrades: &["Stimpack", "ShieldWall", "TerranInfantryWeaponsLevel1", "TerranInfantryArmorsLevel1"],
};

pub const PROTOSS: RaceRoster = RaceRoster {
    name: "protoss",
    base: "Nexus",
    worker: "Probe",
    tech: &["Gateway", "RoboticsFacility", "Stargate", "TemplarArchive"],
    army: &["Zealot", "Stalker", "Stalker", "Adept", "Immortal", "Colossus", "Archon"],
    upgrades: &["WarpGateResearch", "BlinkTech", "Charge", "ProtossGroundWeaponsLevel1"],
};

pub const ZERG: RaceRoster = RaceRoster {
    name: "zerg",
    base: "Hatchery",
    worker: "Drone",
    tech: &["SpawningPool", "RoachWarren", "Spire", "HydraliskDen"],
    army: &["Zergling", "Zergling", "Baneling", "Roach", "Ravager", "Hydralisk", "Ultralisk"],
    upgrades: &["ZerglingMovementSpeed", "GlialReconstitution", "ZergMissileWeaponsLevel1", "ZergGroundArmorsLevel1"],
};

const RACES: [RaceRoster; 3] = [TERRAN, PROTOSS, ZERG];

/// Home base positions for players 1 and 2 on a 200-unit map.
const HOMES: [(i32, i32); 2] = [(40, 40), (160, 160)];

/// Deterministic generator for a scripted two-player game.
#[derive(Debug, Clone)]
pub struct SyntheticEventGenerator {
    duration: GameSeconds,
    seed: u64,
}

impl SyntheticEventGenerator {
    /// Creates a generator seeded from the duration and player names.
    pub fn new(duration: GameSeconds, players: &[String]) -> Self {
        Self {
            duration,
            seed: synthetic_seed(duration, players),
        }
    }

    /// Creates a generator with an explicit seed.
    pub fn with_seed(duration: GameSeconds, seed: u64) -> Self {
        Self { duration, seed }
    }

    /// Returns the RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates the full event list, sorted by timestamp.
    ///
    /// Events that would land at or after the end of the game are discarded.
    pub fn generate(&self) -> Vec<RawEvent> {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let rosters = [
            RACES[rng.gen_range(0..RACES.len())],
            RACES[rng.gen_range(0..RACES.len())],
        ];

        let mut events = Vec::new();
        self.opening(&rosters, &mut events);
        self.early_game(&mut rng, &rosters, &mut events);
        self.mid_game(&mut rng, &rosters, &mut events);
        self.late_game(&mut rng, &rosters, &mut events);

        events.retain(|e| e.timestamp < self.duration);
        events.sort_by_key(|e| e.timestamp);

        info!(
            "Generated {} synthetic events for a {}s game ({} vs {})",
            events.len(),
            self.duration,
            rosters[0].name,
            rosters[1].name
        );
        events
    }

    fn opening(&self, rosters: &[RaceRoster; 2], events: &mut Vec<RawEvent>) {
        for (idx, roster) in rosters.iter().enumerate() {
            let (x, y) = HOMES[idx];
            events.push(RawEvent::birth(0, player_number(idx), roster.base).at(x, y));
        }
    }

    fn early_game(&self, rng: &mut SmallRng, rosters: &[RaceRoster; 2], events: &mut Vec<RawEvent>) {
        for (idx, roster) in rosters.iter().enumerate() {
            let player = player_number(idx);
            let (x, y) = near_home(rng, idx, 25);
            events.push(RawEvent::birth(rng.gen_range(40..=60), player, roster.base).at(x, y));

            for building in &roster.tech[..2] {
                let (x, y) = near_home(rng, idx, 15);
                events.push(RawEvent::birth(rng.gen_range(45..=75), player, *building).at(x, y));
            }
        }
    }

    fn mid_game(&self, rng: &mut SmallRng, rosters: &[RaceRoster; 2], events: &mut Vec<RawEvent>) {
        for (idx, roster) in rosters.iter().enumerate() {
            let player = player_number(idx);
            let (x, y) = near_home(rng, idx, 45);
            events.push(RawEvent::birth(rng.gen_range(140..=180), player, roster.base).at(x, y));

            let (x, y) = near_home(rng, idx, 15);
            events.push(RawEvent::birth(rng.gen_range(120..=170), player, roster.tech[2]).at(x, y));

            let upgrade = roster.upgrades[rng.gen_range(0..roster.upgrades.len())];
            events.push(RawEvent::upgrade(rng.gen_range(150..=220), player, upgrade));

            for _ in 0..3 {
                let unit = roster.army[rng.gen_range(0..roster.army.len())];
                let (x, y) = near_home(rng, idx, 10);
                events.push(RawEvent::birth(rng.gen_range(150..=220), player, unit).at(x, y));
            }
        }

        let skirmishes = rng.gen_range(3..=5);
        for _ in 0..skirmishes {
            let time = rng.gen_range(130..=230);
            let center = (rng.gen_range(70..=130), rng.gen_range(70..=130));
            let deaths = rng.gen_range(3..=6);
            battle(rng, rosters, time, center, deaths, events);
        }
    }

    fn late_game(&self, rng: &mut SmallRng, rosters: &[RaceRoster; 2], events: &mut Vec<RawEvent>) {
        if self.duration < 240 {
            return;
        }

        let battle_end = self.duration.saturating_sub(20).min(300).max(240);
        let major_battles = rng.gen_range(2..=4);
        for _ in 0..major_battles {
            let time = rng.gen_range(240..=battle_end);
            let center = (rng.gen_range(60..=140), rng.gen_range(60..=140));
            let deaths = rng.gen_range(10..=18);
            battle(rng, rosters, time, center, deaths, events);
        }

        let attack_end = self.duration.saturating_sub(10).min(300).max(260);
        let base_attacks = rng.gen_range(1..=2);
        for _ in 0..base_attacks {
            let time = rng.gen_range(260..=attack_end);
            let defender = rng.gen_range(0..2usize);
            let roster = &rosters[defender];
            let (x, y) = near_home(rng, defender, 25);
            let player = player_number(defender);

            events.push(RawEvent::death(time, player, roster.base).at(x, y));
            for _ in 0..rng.gen_range(2..=4) {
                let (dt, dx, dy) = jitter(rng);
                events.push(
                    RawEvent::death(time.saturating_add_signed(dt), player, roster.worker)
                        .at(x + dx, y + dy),
                );
            }
        }

        let (x, y) = near_home(rng, 0, 15);
        events.push(RawEvent::birth(rng.gen_range(240..=battle_end), 1, rosters[0].tech[3]).at(x, y));
        for (idx, roster) in rosters.iter().enumerate() {
            let upgrade = roster.upgrades[rng.gen_range(0..roster.upgrades.len())];
            events.push(RawEvent::upgrade(rng.gen_range(240..=battle_end), player_number(idx), upgrade));
        }
    }
}

/// Emits a cluster of deaths from both armies around one time and place.
fn battle(
    rng: &mut SmallRng,
    rosters: &[RaceRoster; 2],
    time: GameSeconds,
    center: (i32, i32),
    deaths: usize,
    events: &mut Vec<RawEvent>,
) {
    for _ in 0..deaths {
        let side = rng.gen_range(0..2usize);
        let roster = &rosters[side];
        let unit = roster.army[rng.gen_range(0..roster.army.len())];
        let (dt, dx, dy) = jitter(rng);
        events.push(
            RawEvent::death(time.saturating_add_signed(dt), player_number(side), unit)
                .at(center.0 + dx, center.1 + dy),
        );
    }
}

fn jitter(rng: &mut SmallRng) -> (i32, i32, i32) {
    (
        rng.gen_range(-3..=3),
        rng.gen_range(-3..=3),
        rng.gen_range(-3..=3),
    )
}

fn near_home(rng: &mut SmallRng, idx: usize, spread: i32) -> (i32, i32) {
    let (x, y) = HOMES[idx];
    let toward_center = if idx == 0 { 1 } else { -1 };
    (
        x + toward_center * rng.gen_range(0..=spread),
        y + toward_center * rng.gen_range(0..=spread),
    )
}

fn player_number(idx: usize) -> u32 {
    idx as u32 + 1
}
