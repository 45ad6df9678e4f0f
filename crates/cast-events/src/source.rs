//! Replay event sources.
//!
//! A [`ReplayEventSource`] turns a replay identifier into a finite, ordered
//! list of [`RawEvent`]s. Decoding the binary replay format lives outside this
//! workspace; an external decoder dumps events as JSON and
//! [`JsonlEventSource`] reads them back.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::event::RawEvent;
use crate::synthetic::SyntheticEventGenerator;
use crate::timestamp::GameSeconds;

/// Errors raised while loading replay events.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The replay cannot be decoded by this source
    #[error("unsupported replay format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    /// IO error reading the replay
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A line (or the whole document) failed to parse
    #[error("malformed event at line {line} of {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Adapter presenting decoded replay events behind a stable contract.
pub trait ReplayEventSource {
    /// Loads all events for a replay, ordered by timestamp.
    fn load(&self, replay: &Path) -> Result<Vec<RawEvent>, SourceError>;
}

/// Reads events from `.jsonl` (one event per line) or `.json` files.
///
/// A `.json` file holds either an array of events or an object with an
/// `events` array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlEventSource;

impl JsonlEventSource {
    /// Creates a new source.
    pub fn new() -> Self {
        Self
    }

    fn read_lines(path: &Path, content: &str) -> Result<Vec<RawEvent>, SourceError> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                RawEvent::from_jsonl(line).map_err(|source| SourceError::Malformed {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    source,
                })
            })
            .collect()
    }

    fn read_document(path: &Path, content: &str) -> Result<Vec<RawEvent>, SourceError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            Bare(Vec<RawEvent>),
            Wrapped { events: Vec<RawEvent> },
        }

        let doc: Document =
            serde_json::from_str(content).map_err(|source| SourceError::Malformed {
                path: path.to_path_buf(),
                line: source.line(),
                source,
            })?;

        Ok(match doc {
            Document::Bare(events) => events,
            Document::Wrapped { events } => events,
        })
    }
}

impl ReplayEventSource for JsonlEventSource {
    fn load(&self, replay: &Path) -> Result<Vec<RawEvent>, SourceError> {
        let extension = replay
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|source| SourceError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        let mut events = match extension.as_deref() {
            Some("jsonl") => Self::read_lines(replay, &read(replay)?)?,
            Some("json") => Self::read_document(replay, &read(replay)?)?,
            _ => return Err(SourceError::UnsupportedFormat(replay.to_path_buf())),
        };

        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}

/// Where a set of events came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    /// Decoded from the replay itself
    Replay,
    /// Produced by the synthetic fallback generator
    Synthetic,
}

/// Loads events from `source`, falling back to synthetic events when the
/// replay format is unsupported.
///
/// Every other error propagates.
pub fn load_events_or_synthesize(
    source: &dyn ReplayEventSource,
    replay: &Path,
    duration: GameSeconds,
    players: &[String],
) -> Result<(Vec<RawEvent>, EventOrigin), SourceError> {
    match source.load(replay) {
        Ok(events) => {
            info!("Loaded {} events from {}", events.len(), replay.display());
            Ok((events, EventOrigin::Replay))
        }
        Err(SourceError::UnsupportedFormat(path)) => {
            warn!(
                "Unsupported replay format for {}, generating synthetic events",
                path.display()
            );
            let events = SyntheticEventGenerator::new(duration, players).generate();
            Ok((events, EventOrigin::Synthetic))
        }
        Err(e) => Err(e),
    }
}
