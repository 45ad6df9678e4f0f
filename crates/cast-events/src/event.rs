//! Event Types
//!
//! Raw replay events and the small value types shared by every stage of the
//! pipeline.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::timestamp::GameSeconds;

/// Kind of raw replay event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A unit or structure came into existence
    Birth,
    /// A unit or structure was destroyed
    Death,
    /// An upgrade finished researching
    Upgrade,
}

impl EventKind {
    /// Returns all event kind variants.
    pub fn all() -> &'static [EventKind] {
        &[EventKind::Birth, EventKind::Death, EventKind::Upgrade]
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Birth => write!(f, "birth"),
            EventKind::Death => write!(f, "death"),
            EventKind::Upgrade => write!(f, "upgrade"),
        }
    }
}

/// A map position in game units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    /// Creates a new location.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another location.
    pub fn distance_to(&self, other: &Location) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Integer-truncated mean of a set of locations.
    ///
    /// Returns `None` for an empty set.
    pub fn centroid<'a>(locations: impl IntoIterator<Item = &'a Location>) -> Option<Location> {
        let mut count: i64 = 0;
        let mut sum_x: i64 = 0;
        let mut sum_y: i64 = 0;
        for loc in locations {
            count += 1;
            sum_x += i64::from(loc.x);
            sum_y += i64::from(loc.y);
        }
        if count == 0 {
            return None;
        }
        // Division on i64 truncates toward zero.
        Some(Location::new((sum_x / count) as i32, (sum_y / count) as i32))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// How prominently an event deserves to be shown.
///
/// Ordered `Low < Medium < High` so classes can be compared and ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    High,
    Medium,
    Low,
}

impl PriorityClass {
    fn rank(self) -> u8 {
        match self {
            PriorityClass::Low => 0,
            PriorityClass::Medium => 1,
            PriorityClass::High => 2,
        }
    }

    /// Returns true for `High` and `Medium`.
    pub fn is_notable(self) -> bool {
        self >= PriorityClass::Medium
    }

    /// Returns all classes from highest to lowest.
    pub fn all() -> &'static [PriorityClass] {
        &[PriorityClass::High, PriorityClass::Medium, PriorityClass::Low]
    }
}

impl PartialOrd for PriorityClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityClass {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityClass::High => write!(f, "high"),
            PriorityClass::Medium => write!(f, "medium"),
            PriorityClass::Low => write!(f, "low"),
        }
    }
}

/// A single event decoded from a replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Game time in whole seconds
    pub timestamp: GameSeconds,
    /// Event kind
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Owning (or, for deaths, killing) player
    #[serde(default)]
    pub player: u32,
    /// Unit, structure or upgrade name as reported by the replay
    pub name: String,
    /// Map position, when the replay records one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl RawEvent {
    /// Creates a new event without a location.
    pub fn new(timestamp: GameSeconds, kind: EventKind, player: u32, name: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind,
            player,
            name: name.into(),
            location: None,
        }
    }

    /// Creates a birth event.
    pub fn birth(timestamp: GameSeconds, player: u32, name: impl Into<String>) -> Self {
        Self::new(timestamp, EventKind::Birth, player, name)
    }

    /// Creates a death event.
    pub fn death(timestamp: GameSeconds, player: u32, name: impl Into<String>) -> Self {
        Self::new(timestamp, EventKind::Death, player, name)
    }

    /// Creates an upgrade event.
    pub fn upgrade(timestamp: GameSeconds, player: u32, name: impl Into<String>) -> Self {
        Self::new(timestamp, EventKind::Upgrade, player, name)
    }

    /// Sets the location.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.location = Some(Location::new(x, y));
        self
    }

    /// Lowercased name, used for every table lookup.
    pub fn normalized_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Parses an event from a single JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Serializes the event as a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(PriorityClass::High > PriorityClass::Medium);
        assert!(PriorityClass::Medium > PriorityClass::Low);
        assert_eq!(
            PriorityClass::all().iter().max(),
            Some(&PriorityClass::High)
        );
        assert!(PriorityClass::Medium.is_notable());
        assert!(!PriorityClass::Low.is_notable());
    }

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_string(&PriorityClass::High).unwrap(), r#""high""#);
        assert_eq!(serde_json::to_string(&PriorityClass::Low).unwrap(), r#""low""#);
    }

    #[test]
    fn test_event_json_shape() {
        let event = RawEvent::death(105, 2, "Stalker").at(40, 52);
        let json = event.to_jsonl().unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":105,"type":"death","player":2,"name":"Stalker","location":{"x":40,"y":52}}"#
        );
    }

    #[test]
    fn test_event_without_location_omits_field() {
        let event = RawEvent::upgrade(300, 1, "TerranInfantryWeaponsLevel1");
        let json = event.to_jsonl().unwrap();
        assert!(!json.contains("location"));

        let parsed = RawEvent::from_jsonl(&json).unwrap();
        assert_eq!(parsed.location, None);
        assert_eq!(parsed.kind, EventKind::Upgrade);
    }

    #[test]
    fn test_event_rejects_unknown_kind() {
        let line = r#"{"timestamp":1,"type":"teleport","player":1,"name":"Probe"}"#;
        assert!(RawEvent::from_jsonl(line).is_err());
    }

    #[test]
    fn test_distance() {
        let a = Location::new(0, 0);
        let b = Location::new(3, 4);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_centroid_truncates() {
        let locs = [Location::new(10, 10), Location::new(11, 12), Location::new(11, 12)];
        // x = 32/3 = 10.67 -> 10, y = 34/3 = 11.33 -> 11
        assert_eq!(Location::centroid(&locs), Some(Location::new(10, 11)));
        assert_eq!(Location::centroid(&[]), None);
    }

    #[test]
    fn test_normalized_name() {
        let event = RawEvent::birth(0, 1, "CommandCenter");
        assert_eq!(event.normalized_name(), "commandcenter");
    }
}
