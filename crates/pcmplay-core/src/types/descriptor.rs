//! PCM stream format types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::frame::MAX_CHANNELS;
use crate::{Error, Result};

/// Sample encoding of a raw PCM stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Signed 16-bit little-endian.
    #[default]
    S16le,
}

impl SampleFormat {
    /// Width of one sample in bytes.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16le => 2,
        }
    }

    /// Width of one sample in bits.
    pub const fn bits_per_sample(self) -> u16 {
        match self {
            Self::S16le => 16,
        }
    }
}

/// Immutable description of a header-less PCM stream.
///
/// A player is built around exactly one descriptor and never renegotiates it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PcmDescriptor {
    sample_rate: u32,
    channels: u16,
    format: SampleFormat,
}

impl PcmDescriptor {
    /// The format the frontend and backend agree on: 16 kHz, mono, s16le.
    pub const STREAM: Self = Self {
        sample_rate: 16_000,
        channels: 1,
        format: SampleFormat::S16le,
    };

    /// Build a descriptor with a custom rate and channel count.
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidArgument(
                "sample rate must be non-zero".to_string(),
            ));
        }
        if channels == 0 || usize::from(channels) > MAX_CHANNELS {
            return Err(Error::InvalidArgument(format!(
                "channel count must be between 1 and {MAX_CHANNELS}, got {channels}"
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            format: SampleFormat::S16le,
        })
    }

    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub const fn channels(&self) -> u16 {
        self.channels
    }

    pub const fn format(&self) -> SampleFormat {
        self.format
    }

    /// Size of one frame (one sample per channel) in bytes.
    pub const fn bytes_per_frame(&self) -> usize {
        self.format.bytes_per_sample() * self.channels as usize
    }

    /// Bytes consumed per second of audio.
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate * self.bytes_per_frame() as u32
    }

    /// Number of frames covering `duration`, rounded down.
    pub fn frames_in(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * f64::from(self.sample_rate)) as usize
    }

    /// Playback time of `frames` frames.
    pub fn duration_of(&self, frames: usize) -> Duration {
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }
}

impl Default for PcmDescriptor {
    fn default() -> Self {
        Self::STREAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_format() {
        let desc = PcmDescriptor::STREAM;
        assert_eq!(desc.sample_rate(), 16_000);
        assert_eq!(desc.channels(), 1);
        assert_eq!(desc.format(), SampleFormat::S16le);
        assert_eq!(desc.bytes_per_frame(), 2);
        assert_eq!(desc.byte_rate(), 32_000);
    }

    #[test]
    fn test_frames_and_duration() {
        let desc = PcmDescriptor::STREAM;
        assert_eq!(desc.frames_in(Duration::from_secs(2)), 32_000);
        assert_eq!(desc.frames_in(Duration::from_millis(10)), 160);
        assert_eq!(desc.duration_of(8_000), Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_descriptor() {
        assert!(PcmDescriptor::new(0, 1).is_err());
        assert!(PcmDescriptor::new(16_000, 0).is_err());
        assert!(PcmDescriptor::new(16_000, 3).is_err());
        assert!(PcmDescriptor::new(48_000, 2).is_ok());
    }
}
