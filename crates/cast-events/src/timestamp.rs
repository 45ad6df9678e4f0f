//! Game Time Helpers
//!
//! Replay time is measured in whole game seconds. Humans (and the on-screen
//! timer) read it as `M:SS`, so this module converts between the two and
//! cleans up raw timer text produced by an external digit recognizer.
//!
//! # Example
//!
//! ```
//! use cast_events::{format_game_time, parse_game_time, parse_timer_text};
//!
//! assert_eq!(format_game_time(378), "6:18");
//! assert_eq!(parse_game_time("6:18").unwrap(), 378);
//! assert_eq!(parse_timer_text("O6.18 / 9:28"), Some(378));
//! ```

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Whole game seconds since the start of the replay.
pub type GameSeconds = u32;

/// Formats game seconds as `M:SS`.
pub fn format_game_time(seconds: GameSeconds) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Error type for parsing strict `M:SS` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTimeError {
    InvalidFormat(String),
    InvalidMinutes(String),
    InvalidSeconds(String),
}

impl fmt::Display for ParseTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTimeError::InvalidFormat(s) => {
                write!(f, "invalid time format: '{}', expected 'M:SS'", s)
            }
            ParseTimeError::InvalidMinutes(s) => write!(f, "invalid minutes: '{}'", s),
            ParseTimeError::InvalidSeconds(s) => write!(f, "invalid seconds: '{}'", s),
        }
    }
}

impl std::error::Error for ParseTimeError {}

/// Parses a strict `M:SS` string into game seconds.
///
/// Seconds must be two digits in `00..=59`.
pub fn parse_game_time(s: &str) -> Result<GameSeconds, ParseTimeError> {
    let (minutes, seconds) = s
        .trim()
        .split_once(':')
        .ok_or_else(|| ParseTimeError::InvalidFormat(s.to_string()))?;

    let minutes = minutes
        .parse::<u32>()
        .map_err(|_| ParseTimeError::InvalidMinutes(minutes.to_string()))?;

    if seconds.len() != 2 {
        return Err(ParseTimeError::InvalidSeconds(seconds.to_string()));
    }
    let seconds = seconds
        .parse::<u32>()
        .ok()
        .filter(|s| *s < 60)
        .ok_or_else(|| ParseTimeError::InvalidSeconds(seconds.to_string()))?;

    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(|| ParseTimeError::InvalidMinutes(s.trim().to_string()))
}

/// Cleans raw on-screen timer text and extracts the current game time.
///
/// The recognizer commonly confuses `:` with `.`, `,` or `|`, `1` with `I`
/// and `0` with `O`/`o`. The timer may also render as `current / total`, in
/// which case only the part before the slash counts. Returns `None` when no
/// `M:SS` (or `MM:SS`) group can be found.
pub fn parse_timer_text(raw: &str) -> Option<GameSeconds> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ' ')
        .map(|c| match c {
            '.' | ',' | '|' => ':',
            'I' => '1',
            'O' | 'o' => '0',
            other => other,
        })
        .collect();

    let current = cleaned.split('/').next().unwrap_or("");
    find_clock_group(current)
}

/// Finds the first `D{1,2}:DD` group in `text`.
fn find_clock_group(text: &str) -> Option<GameSeconds> {
    let bytes = text.as_bytes();

    for (colon, _) in text.match_indices(':') {
        let after = &bytes[colon + 1..];
        if after.len() < 2 || !after[0].is_ascii_digit() || !after[1].is_ascii_digit() {
            continue;
        }

        let mut start = colon;
        while start > 0 && colon - start < 2 && bytes[start - 1].is_ascii_digit() {
            start -= 1;
        }
        if start == colon {
            continue;
        }

        // Both slices are ASCII digits, so parsing cannot fail.
        let minutes: u32 = text[start..colon].parse().ok()?;
        let seconds: u32 = text[colon + 1..colon + 3].parse().ok()?;
        return minutes.checked_mul(60)?.checked_add(seconds);
    }

    None
}

/// Deserializes game seconds from either an integer or an `M:SS` string.
///
/// Hand-written scripts use `"1:30"`; generated documents use `90`.
pub fn deserialize_flexible_seconds<'de, D>(deserializer: D) -> Result<GameSeconds, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Seconds(GameSeconds),
        Clock(String),
    }

    match Flexible::deserialize(deserializer)? {
        Flexible::Seconds(s) => Ok(s),
        Flexible::Clock(s) => parse_game_time(&s).map_err(serde::de::Error::custom),
    }
}
