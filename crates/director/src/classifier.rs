//! Keyword classification of raw events.
//!
//! Maps an event kind and entity name to a [`PriorityClass`] with fixed,
//! case-insensitive substring tables. Total: anything unmatched is `Low`.

use cast_events::{EventKind, PriorityClass, RawEvent};

const BIRTH_HIGH: &[&str] = &[
    "hatchery", "nexus", "command", "orbital", "lair", "hive", "spire", "fleet", "stargate",
    "robo",
];
const BIRTH_MEDIUM: &[&str] = &["gateway", "barracks", "factory", "starport"];

const DEATH_HIGH: &[&str] = &[
    "hatchery", "nexus", "command", "orbital", "carrier", "battlecruiser", "mothership",
    "colossus", "thor", "ultralisk", "broodlord",
];
const DEATH_MEDIUM: &[&str] = &["stalker", "marine", "zergling", "roach", "hydralisk", "baneling"];

const UPGRADE_COSMETIC: &str = "spray";
const UPGRADE_MEDIUM: &[&str] = &["speed", "attack", "armor", "range"];

/// Classifies an event by kind and entity name.
pub fn classify(kind: EventKind, name: &str) -> PriorityClass {
    let name = name.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

    match kind {
        EventKind::Birth => {
            if matches(BIRTH_HIGH) {
                PriorityClass::High
            } else if matches(BIRTH_MEDIUM) {
                PriorityClass::Medium
            } else {
                PriorityClass::Low
            }
        }
        EventKind::Death => {
            if matches(DEATH_HIGH) {
                PriorityClass::High
            } else if matches(DEATH_MEDIUM) {
                PriorityClass::Medium
            } else {
                PriorityClass::Low
            }
        }
        EventKind::Upgrade => {
            if name.contains(UPGRADE_COSMETIC) {
                PriorityClass::Low
            } else if matches(UPGRADE_MEDIUM) {
                PriorityClass::Medium
            } else {
                PriorityClass::Low
            }
        }
    }
}

/// Classifies a raw event.
pub fn classify_event(event: &RawEvent) -> PriorityClass {
    classify(event.kind, &event.name)
}
