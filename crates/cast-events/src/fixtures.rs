//! Sample data fixtures for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // cast-events = { path = "../cast-events", features = ["test-fixtures"] }
//!
//! use cast_events::fixtures;
//!
//! let events = fixtures::sample_events();
//! ```

use crate::{EventKind, GameSeconds, RawEvent};

/// Length of the sample game in seconds.
pub const SAMPLE_DURATION: GameSeconds = 300;

/// Returns sample events from the fixtures file.
///
/// A 5:00 Terran vs Protoss game containing:
/// - 2 starting bases and 2 expansions (0:58, 1:05)
/// - 2 tech structures (Stargate 1:35, Factory 3:20) and 2 plain ones
/// - a 4-death low-value skirmish (1:40 to 1:55)
/// - a 2-death exchange that is too small to count as a battle
/// - a 5-death zergling/baneling/roach fight (2:50 to 2:56)
/// - a 6-death high-value battle (3:50 to 4:00)
/// - 3 upgrades, one of them cosmetic
pub fn sample_events() -> Vec<RawEvent> {
    let jsonl = include_str!("../tests/fixtures/sample_events.jsonl");
    jsonl
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            RawEvent::from_jsonl(l).unwrap_or_else(|e| {
                panic!("Failed to parse event line: {}\nError: {}", l, e)
            })
        })
        .collect()
}

/// Returns only the death events from the samples.
pub fn sample_deaths() -> Vec<RawEvent> {
    sample_events()
        .into_iter()
        .filter(|e| e.kind == EventKind::Death)
        .collect()
}

/// Four two-value army deaths, five seconds apart, within a few units.
pub fn skirmish_deaths() -> Vec<RawEvent> {
    vec![
        RawEvent::death(100, 2, "Stalker").at(100, 100),
        RawEvent::death(105, 1, "Marauder").at(102, 101),
        RawEvent::death(110, 2, "Stalker").at(104, 99),
        RawEvent::death(115, 1, "Marauder").at(101, 103),
    ]
}

/// Player names used with the sample game.
pub fn sample_players() -> Vec<String> {
    vec!["Maru".to_string(), "herO".to_string()]
}
