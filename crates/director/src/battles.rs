//! Battle clustering.
//!
//! Groups army-unit deaths into discrete battles with a single left-to-right
//! scan. A death joins the open cluster when it is close to the cluster's
//! most recent death in both time and space; otherwise the open cluster is
//! flushed and a new one starts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use cast_events::{GameSeconds, Location, PriorityClass, RawEvent};

use crate::config::{ClusteringConfig, UnitValueTable};

/// A clustered group of army-unit deaths close in time and space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battle {
    /// Timestamp of the first death
    pub start: GameSeconds,
    /// Timestamp of the last death
    pub end: GameSeconds,
    /// Integer-truncated centroid of the deaths
    pub location: Location,
    /// Member deaths ordered by timestamp
    pub deaths: Vec<RawEvent>,
    /// Summed army value of the deaths, truncated
    pub value_lost: u32,
    pub priority: PriorityClass,
}

impl Battle {
    /// Seconds from first to last death.
    pub fn duration(&self) -> GameSeconds {
        self.end - self.start
    }

    /// Midpoint of the battle, rounded down.
    pub fn peak_time(&self) -> GameSeconds {
        self.start + (self.end - self.start) / 2
    }

    pub fn death_count(&self) -> usize {
        self.deaths.len()
    }
}

/// Result of one clustering pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterOutcome {
    pub battles: Vec<Battle>,
    /// Clusters discarded for having too few deaths
    pub dropped_clusters: usize,
    /// Deaths belonging to discarded clusters
    pub dropped_deaths: usize,
}

/// Clusters pre-filtered death events into battles.
#[derive(Debug, Clone, Default)]
pub struct BattleClusterer {
    config: ClusteringConfig,
    values: UnitValueTable,
}

impl BattleClusterer {
    /// Creates a clusterer with the given windows and value table.
    pub fn new(config: ClusteringConfig, values: UnitValueTable) -> Self {
        Self { config, values }
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    pub fn values(&self) -> &UnitValueTable {
        &self.values
    }

    /// Clusters deaths into battles.
    ///
    /// Callers are expected to pass only located army-unit deaths. A death
    /// without a location never joins an existing cluster.
    pub fn cluster(&self, deaths: &[RawEvent]) -> ClusterOutcome {
        let mut sorted: Vec<&RawEvent> = deaths.iter().collect();
        sorted.sort_by_key(|d| d.timestamp);

        let mut outcome = ClusterOutcome::default();
        let mut current: Vec<&RawEvent> = Vec::new();

        for death in sorted {
            let joins = current
                .last()
                .is_some_and(|last| self.is_continuation(last, death));

            if !joins && !current.is_empty() {
                self.flush(&mut current, &mut outcome);
            }
            current.push(death);
        }
        if !current.is_empty() {
            self.flush(&mut current, &mut outcome);
        }

        outcome
    }

    fn is_continuation(&self, last: &RawEvent, next: &RawEvent) -> bool {
        let close_in_time = next.timestamp.saturating_sub(last.timestamp) <= self.config.time_window;
        let close_in_space = match (&last.location, &next.location) {
            (Some(a), Some(b)) => a.distance_to(b) <= self.config.space_window,
            _ => false,
        };
        close_in_time && close_in_space
    }

    fn flush(&self, cluster: &mut Vec<&RawEvent>, outcome: &mut ClusterOutcome) {
        let members: Vec<RawEvent> = cluster.drain(..).cloned().collect();

        if members.len() < self.config.min_deaths {
            debug!(
                "Dropping {}-death cluster at {}s (below {} deaths)",
                members.len(),
                members[0].timestamp,
                self.config.min_deaths
            );
            outcome.dropped_clusters += 1;
            outcome.dropped_deaths += members.len();
            return;
        }

        let Some(location) = Location::centroid(members.iter().filter_map(|d| d.location.as_ref()))
        else {
            // A cluster of unlocated deaths has no place to point the camera.
            outcome.dropped_clusters += 1;
            outcome.dropped_deaths += members.len();
            return;
        };

        let total: f32 = members
            .iter()
            .map(|d| self.values.value_or_default(&d.name))
            .sum();
        let priority = self.battle_priority(total, members.len());

        let battle = Battle {
            start: members[0].timestamp,
            end: members[members.len() - 1].timestamp,
            location,
            value_lost: total as u32,
            priority,
            deaths: members,
        };
        debug!(
            "Battle {}s-{}s at {}: {} deaths, {} value, {}",
            battle.start,
            battle.end,
            battle.location,
            battle.death_count(),
            battle.value_lost,
            battle.priority
        );
        outcome.battles.push(battle);
    }

    /// Priority from the untruncated value total and the death count.
    pub fn battle_priority(&self, value: f32, count: usize) -> PriorityClass {
        let c = &self.config;
        if value >= c.high_value || count >= c.high_count {
            PriorityClass::High
        } else if value >= c.medium_value || count >= c.medium_count {
            PriorityClass::Medium
        } else {
            PriorityClass::Low
        }
    }
}
