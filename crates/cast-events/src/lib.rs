//! Shared event types and replay event sources for replaycast.
//!
//! This crate contains pure data structures and the adapters that produce
//! them. It has no scheduling logic and is a dependency for all other crates
//! in the workspace.

pub mod event;
pub mod source;
pub mod synthetic;
pub mod timestamp;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

// Re-export timestamp helpers
pub use timestamp::{
    deserialize_flexible_seconds, format_game_time, parse_game_time, parse_timer_text,
    GameSeconds, ParseTimeError,
};

// Re-export event types
pub use event::*;

// Re-export sources
pub use source::{
    load_events_or_synthesize, EventOrigin, JsonlEventSource, ReplayEventSource, SourceError,
};
pub use synthetic::{synthetic_seed, SyntheticEventGenerator};
