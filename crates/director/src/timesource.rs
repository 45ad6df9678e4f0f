//! External game-timer readers.
//!
//! A [`TimeSource`] is any noisy sensor that reports the game timer shown
//! on screen. Every call may come back empty.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use cast_events::{format_game_time, parse_timer_text, GameSeconds};

/// One parsed timer sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerReading {
    pub seconds: GameSeconds,
    /// Text as the recognizer produced it
    pub raw: String,
}

impl TimerReading {
    pub fn new(seconds: GameSeconds, raw: impl Into<String>) -> Self {
        Self {
            seconds,
            raw: raw.into(),
        }
    }

    /// A reading whose raw text is the formatted time.
    pub fn from_seconds(seconds: GameSeconds) -> Self {
        Self::new(seconds, format_game_time(seconds))
    }

    /// Parses recognizer output; `None` if unparseable.
    pub fn parse(raw: &str) -> Option<Self> {
        parse_timer_text(raw).map(|seconds| Self::new(seconds, raw))
    }
}

/// A sensor for the on-screen game timer.
pub trait TimeSource {
    /// Takes one sample, `None` when nothing parseable was read.
    fn sample(&mut self) -> Option<TimerReading>;
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn sample(&mut self) -> Option<TimerReading> {
        (**self).sample()
    }
}

/// Reads the latest raw timer text written by an external recognizer.
///
/// The file is re-read on every sample. A missing or unreadable file is
/// treated as an unparseable sample.
#[derive(Debug, Clone)]
pub struct TimerFileSource {
    path: PathBuf,
}

impl TimerFileSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TimeSource for TimerFileSource {
    fn sample(&mut self) -> Option<TimerReading> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let raw = content.trim();
                let reading = TimerReading::parse(raw);
                if reading.is_none() {
                    debug!("Unparseable timer text {:?}", raw);
                }
                reading
            }
            Err(e) => {
                debug!("Timer file {} unreadable: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// Replays a fixed queue of samples, then reports nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTimeSource {
    samples: VecDeque<Option<TimerReading>>,
}

impl ScriptedTimeSource {
    /// Creates a source from seconds; `None` entries are unparseable samples.
    pub fn new(samples: impl IntoIterator<Item = Option<GameSeconds>>) -> Self {
        Self {
            samples: samples
                .into_iter()
                .map(|s| s.map(TimerReading::from_seconds))
                .collect(),
        }
    }

    /// Creates a source from raw recognizer text.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            samples: texts.into_iter().map(TimerReading::parse).collect(),
        }
    }

    /// Queues one more sample.
    pub fn push(&mut self, sample: Option<GameSeconds>) {
        self.samples.push_back(sample.map(TimerReading::from_seconds));
    }

    /// Queues a batch of identical samples.
    pub fn push_repeated(&mut self, seconds: GameSeconds, count: usize) {
        for _ in 0..count {
            self.push(Some(seconds));
        }
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl TimeSource for ScriptedTimeSource {
    fn sample(&mut self) -> Option<TimerReading> {
        self.samples.pop_front().flatten()
    }
}

/// Adapts a closure into a [`TimeSource`].
pub struct FnTimeSource<F>(pub F);

impl<F> TimeSource for FnTimeSource<F>
where
    F: FnMut() -> Option<TimerReading>,
{
    fn sample(&mut self) -> Option<TimerReading> {
        (self.0)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reading_parse() {
        let reading = TimerReading::parse("1O:O5").unwrap();
        assert_eq!(reading.seconds, 605);
        assert_eq!(reading.raw, "1O:O5");

        assert!(TimerReading::parse("loading...").is_none());
    }

    #[test]
    fn test_scripted_source() {
        let mut source = ScriptedTimeSource::new([Some(62), None, Some(64)]);
        assert_eq!(source.remaining(), 3);

        assert_eq!(source.sample().map(|r| r.seconds), Some(62));
        assert_eq!(source.sample(), None);
        assert_eq!(source.sample(), Some(TimerReading::new(64, "1:04")));
        // Exhausted
        assert_eq!(source.sample(), None);
    }

    #[test]
    fn test_scripted_from_texts() {
        let mut source = ScriptedTimeSource::from_texts(["0:45 / 9:28", "garbage"]);
        assert_eq!(source.sample().map(|r| r.seconds), Some(45));
        assert_eq!(source.sample(), None);
    }

    #[test]
    fn test_timer_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, " 1:O3 ").unwrap();
        file.flush().unwrap();

        let mut source = TimerFileSource::new(file.path());
        let reading = source.sample().unwrap();
        assert_eq!(reading.seconds, 63);
        assert_eq!(reading.raw, "1:O3");
    }

    #[test]
    fn test_timer_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = TimerFileSource::new(&dir.path().join("timer.txt"));
        assert_eq!(source.sample(), None);
    }

    #[test]
    fn test_fn_source() {
        let mut n = 0;
        let mut source = FnTimeSource(|| {
            n += 1;
            Some(TimerReading::from_seconds(n))
        });
        assert_eq!(source.sample().map(|r| r.seconds), Some(1));
        assert_eq!(source.sample().map(|r| r.seconds), Some(2));
    }
}
