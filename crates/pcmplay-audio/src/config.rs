//! Player configuration.

use std::path::Path;
use std::time::Duration;

use pcmplay_core::{PcmDescriptor, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::output::CpalSink;
use crate::sink::{AudioSink, ClockSink};

/// Default buffer length: two seconds of 16 kHz audio.
pub const DEFAULT_BUFFER_CAPACITY: usize = 16_000 * 2;

/// Default headless sink tick.
pub const DEFAULT_TICK_MS: u64 = 10;

/// Default time a drained stream waits for more audio before it ends.
pub const DEFAULT_END_GRACE_MS: u64 = 250;

/// Which sink drains the playback buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum SinkKind {
    /// The default cpal output device.
    #[default]
    Device,
    /// A clock thread that consumes audio in real time without hardware.
    Clock { tick_ms: u64 },
}

impl SinkKind {
    pub const fn clock() -> Self {
        Self::Clock {
            tick_ms: DEFAULT_TICK_MS,
        }
    }

    /// Construct a fresh sink of this kind. Devices are opened lazily on start.
    pub fn build(self) -> Box<dyn AudioSink> {
        match self {
            Self::Device => Box::new(CpalSink::new()),
            Self::Clock { tick_ms } => Box::new(ClockSink::new(Duration::from_millis(tick_ms.max(1)))),
        }
    }
}

/// Configuration for one player session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Playback buffer capacity in frames.
    pub buffer_capacity: usize,
    /// Start playing as soon as a payload is buffered.
    pub autoplay: bool,
    pub sink: SinkKind,
    /// How long playback keeps running on an empty buffer before the stream
    /// counts as finished. Also lets the device play out its queued tail.
    pub end_grace_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            autoplay: false,
            sink: SinkKind::Device,
            end_grace_ms: DEFAULT_END_GRACE_MS,
        }
    }
}

impl PlayerConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        debug!("Loaded player config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// The stream format every player uses.
    pub const fn descriptor(&self) -> PcmDescriptor {
        PcmDescriptor::STREAM
    }

    /// Size the buffer to hold `duration` of audio.
    pub fn with_buffer_duration(mut self, duration: Duration) -> Self {
        self.buffer_capacity = self.descriptor().frames_in(duration).max(1);
        self
    }

    /// Buffered playback latency at full capacity.
    pub fn buffer_duration(&self) -> Duration {
        self.descriptor().duration_of(self.buffer_capacity)
    }

    pub const fn end_grace(&self) -> Duration {
        Duration::from_millis(self.end_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.buffer_capacity, 32_000);
        assert_eq!(config.buffer_duration(), Duration::from_secs(2));
        assert!(!config.autoplay);
        assert_eq!(config.sink, SinkKind::Device);
        assert_eq!(config.end_grace(), Duration::from_millis(250));
    }

    #[test]
    fn test_buffer_duration() {
        let config = PlayerConfig::default().with_buffer_duration(Duration::from_millis(250));
        assert_eq!(config.buffer_capacity, 4_000);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"autoplay": true, "sink": {{"kind": "clock", "tick_ms": 5}}}}"#
        )
        .unwrap();

        let config = PlayerConfig::from_json_file(file.path()).unwrap();
        assert!(config.autoplay);
        assert_eq!(config.sink, SinkKind::Clock { tick_ms: 5 });
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }

    #[test]
    fn test_from_json_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PlayerConfig::from_json_file(dir.path().join("missing.json")).is_err());
    }
}
