//! Event prioritization.
//!
//! Three independent channels (battles, expansions, tech completions) are
//! scored and merged into one time-sorted timeline of interesting moments.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use cast_events::{format_game_time, EventKind, GameSeconds, Location, PriorityClass, RawEvent};

use crate::battles::{Battle, BattleClusterer};
use crate::classifier::classify_event;
use crate::config::DirectorConfig;

/// Base structures; a birth after the opening means an expansion.
const EXPANSION_KEYWORDS: &[&str] = &[
    "commandcenter",
    "orbitalcommand",
    "nexus",
    "hatchery",
    "lair",
    "hive",
];

/// Advanced structures worth a look when they finish.
const TECH_KEYWORDS: &[&str] = &[
    "spire",
    "greaterspire",
    "fleetbeacon",
    "templararchive",
    "stargate",
    "roboticsfacility",
    "factory",
    "starport",
    "fusioncore",
];

/// Births before this are starting bases, not expansions.
const EXPANSION_MIN_TIME: GameSeconds = 10;

const EXPANSION_SCORE: u32 = 100;
const EXPANSION_DURATION: u32 = 8;
const TECH_SCORE: u32 = 60;
const TECH_DURATION: u32 = 5;
const BATTLE_MAX_DURATION: u32 = 10;
const BATTLE_DURATION_PAD: u32 = 3;

/// Which channel a timeline moment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentKind {
    Battle,
    Expansion,
    Tech,
}

impl fmt::Display for MomentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MomentKind::Battle => write!(f, "battle"),
            MomentKind::Expansion => write!(f, "expansion"),
            MomentKind::Tech => write!(f, "tech"),
        }
    }
}

/// A scored moment on the prioritized timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedEvent {
    /// Game time the moment is anchored to
    pub time: GameSeconds,
    pub kind: MomentKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub priority: PriorityClass,
    pub score: u32,
    /// How long the moment deserves screen time, in seconds
    pub duration: u32,
}

impl PrioritizedEvent {
    fn from_battle(battle: &Battle) -> Self {
        let bonus = match battle.priority {
            PriorityClass::High => 50,
            PriorityClass::Medium => 25,
            PriorityClass::Low => 0,
        };
        Self {
            time: battle.peak_time(),
            kind: MomentKind::Battle,
            description: format!(
                "Battle: {} deaths, {} value lost",
                battle.death_count(),
                battle.value_lost
            ),
            location: Some(battle.location),
            priority: battle.priority,
            score: battle.value_lost.saturating_mul(2).saturating_add(bonus),
            duration: (battle.duration() + BATTLE_DURATION_PAD).min(BATTLE_MAX_DURATION),
        }
    }

    fn expansion(birth: &RawEvent) -> Self {
        Self {
            time: birth.timestamp,
            kind: MomentKind::Expansion,
            description: format!("P{} expands - {}", birth.player, birth.name),
            location: birth.location,
            priority: PriorityClass::High,
            score: EXPANSION_SCORE,
            duration: EXPANSION_DURATION,
        }
    }

    fn tech(birth: &RawEvent) -> Self {
        Self {
            time: birth.timestamp,
            kind: MomentKind::Tech,
            description: format!("P{} builds {}", birth.player, birth.name),
            location: birth.location,
            priority: PriorityClass::Medium,
            score: TECH_SCORE,
            duration: TECH_DURATION,
        }
    }
}

/// Counts per priority class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCounts {
    pub fn add(&mut self, class: PriorityClass) {
        match class {
            PriorityClass::High => self.high += 1,
            PriorityClass::Medium => self.medium += 1,
            PriorityClass::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

impl FromIterator<PriorityClass> for PriorityCounts {
    fn from_iter<I: IntoIterator<Item = PriorityClass>>(iter: I) -> Self {
        let mut counts = Self::default();
        for class in iter {
            counts.add(class);
        }
        counts
    }
}

/// Timeline activity within one game minute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteBucket {
    pub minute: u32,
    /// `"M:00-M:59"`
    pub label: String,
    pub count: usize,
    pub high_priority: usize,
    pub battles: usize,
}

/// Overview of the last prioritization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizationSummary {
    pub total_events: usize,
    /// Battles found by the clusterer
    pub battles: usize,
    /// Expansion moments found
    pub expansions: usize,
    /// Tech moments found, before priority filtering
    pub tech: usize,
    /// Timeline moments per priority
    pub by_priority: PriorityCounts,
    /// Raw events per keyword class
    pub classified: PriorityCounts,
    pub dropped_clusters: usize,
    pub dropped_deaths: usize,
    /// Per-minute breakdown, only minutes with at least one moment
    pub timeline: Vec<MinuteBucket>,
}

/// Scores battles, expansions and tech and merges them into one timeline.
#[derive(Debug, Clone, Default)]
pub struct EventPrioritizer {
    clusterer: BattleClusterer,
    battles: Vec<Battle>,
    expansions: Vec<PrioritizedEvent>,
    tech: Vec<PrioritizedEvent>,
    timeline: Vec<PrioritizedEvent>,
    classified: PriorityCounts,
    dropped_clusters: usize,
    dropped_deaths: usize,
}

impl EventPrioritizer {
    /// Creates a prioritizer using the given clusterer.
    pub fn new(clusterer: BattleClusterer) -> Self {
        Self {
            clusterer,
            ..Self::default()
        }
    }

    /// Creates a prioritizer from the clustering section of a config.
    pub fn from_config(config: &DirectorConfig) -> Self {
        Self::new(BattleClusterer::new(
            config.clustering.clone(),
            config.unit_values.clone(),
        ))
    }

    /// Processes raw events into the prioritized timeline.
    ///
    /// Every call starts from scratch, so repeated calls on the same input
    /// produce the same timeline.
    pub fn process_events(&mut self, events: &[RawEvent]) -> Vec<PrioritizedEvent> {
        self.classified = events.iter().map(classify_event).collect();

        let values = self.clusterer.values();
        let army_deaths: Vec<RawEvent> = events
            .iter()
            .filter(|e| e.kind == EventKind::Death)
            .filter(|e| e.location.is_some() && values.is_army_unit(&e.name))
            .cloned()
            .collect();
        debug!("{} army deaths with locations", army_deaths.len());

        let outcome = self.clusterer.cluster(&army_deaths);
        self.battles = outcome.battles;
        self.dropped_clusters = outcome.dropped_clusters;
        self.dropped_deaths = outcome.dropped_deaths;

        let births = events.iter().filter(|e| e.kind == EventKind::Birth);
        self.expansions = births
            .clone()
            .filter(|e| e.timestamp >= EXPANSION_MIN_TIME && name_matches(e, EXPANSION_KEYWORDS))
            .map(PrioritizedEvent::expansion)
            .collect();
        self.tech = births
            .filter(|e| name_matches(e, TECH_KEYWORDS))
            .map(PrioritizedEvent::tech)
            .collect();

        let mut timeline: Vec<PrioritizedEvent> =
            self.battles.iter().map(PrioritizedEvent::from_battle).collect();
        timeline.extend(self.expansions.iter().cloned());
        timeline.extend(self.tech.iter().filter(|t| t.priority.is_notable()).cloned());
        timeline.sort_by_key(|e| e.time);

        info!(
            "Prioritized {} raw events: {} battles, {} expansions, {} tech -> {} moments",
            events.len(),
            self.battles.len(),
            self.expansions.len(),
            self.tech.len(),
            timeline.len()
        );

        self.timeline = timeline;
        self.timeline.clone()
    }

    /// The timeline from the last call to [`Self::process_events`].
    pub fn timeline(&self) -> &[PrioritizedEvent] {
        &self.timeline
    }

    /// Battles from the last call to [`Self::process_events`].
    pub fn battles(&self) -> &[Battle] {
        &self.battles
    }

    /// Summarizes the last prioritization pass.
    pub fn summary(&self) -> PrioritizationSummary {
        PrioritizationSummary {
            total_events: self.timeline.len(),
            battles: self.battles.len(),
            expansions: self.expansions.len(),
            tech: self.tech.len(),
            by_priority: self.timeline.iter().map(|e| e.priority).collect(),
            classified: self.classified,
            dropped_clusters: self.dropped_clusters,
            dropped_deaths: self.dropped_deaths,
            timeline: minute_buckets(&self.timeline),
        }
    }
}

fn name_matches(event: &RawEvent, keywords: &[&str]) -> bool {
    let name = event.normalized_name();
    keywords.iter().any(|k| name.contains(k))
}

fn minute_buckets(timeline: &[PrioritizedEvent]) -> Vec<MinuteBucket> {
    let mut buckets: Vec<MinuteBucket> = Vec::new();

    for event in timeline {
        let minute = event.time / 60;
        if buckets.last().map(|b| b.minute) != Some(minute) {
            buckets.push(MinuteBucket {
                minute,
                label: format!(
                    "{}-{}",
                    format_game_time(minute * 60),
                    format_game_time((minute * 60).saturating_add(59))
                ),
                count: 0,
                high_priority: 0,
                battles: 0,
            });
        }
        if let Some(bucket) = buckets.last_mut() {
            bucket.count += 1;
            if event.priority == PriorityClass::High {
                bucket.high_priority += 1;
            }
            if event.kind == MomentKind::Battle {
                bucket.battles += 1;
            }
        }
    }

    buckets
}
