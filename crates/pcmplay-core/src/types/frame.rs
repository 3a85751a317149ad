//! Decoded audio frames.

/// Largest channel count a frame can carry.
pub const MAX_CHANNELS: usize = 2;

/// One decoded sample group: a single sample per channel.
///
/// Frames are `Copy` and have no mutators, so a frame never changes after the
/// framer produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFrame {
    samples: [i16; MAX_CHANNELS],
    channels: u8,
}

impl AudioFrame {
    /// A single-channel frame.
    pub const fn mono(sample: i16) -> Self {
        Self {
            samples: [sample, 0],
            channels: 1,
        }
    }

    /// A two-channel frame.
    pub const fn stereo(left: i16, right: i16) -> Self {
        Self {
            samples: [left, right],
            channels: 2,
        }
    }

    /// Build a frame from one sample per channel.
    ///
    /// Returns `None` when `samples` is empty or wider than [`MAX_CHANNELS`].
    pub fn from_samples(samples: &[i16]) -> Option<Self> {
        if samples.is_empty() || samples.len() > MAX_CHANNELS {
            return None;
        }
        let mut out = [0; MAX_CHANNELS];
        out[..samples.len()].copy_from_slice(samples);
        Some(Self {
            samples: out,
            channels: samples.len() as u8,
        })
    }

    /// The samples of this frame, one per channel.
    pub fn samples(&self) -> &[i16] {
        &self.samples[..usize::from(self.channels)]
    }

    pub const fn channels(&self) -> u16 {
        self.channels as u16
    }

    /// First channel's sample.
    pub const fn first(&self) -> i16 {
        self.samples[0]
    }

    /// Sample for output channel `channel`, repeating the last channel when
    /// the output is wider than the frame.
    pub fn sample_for(&self, channel: usize) -> i16 {
        let last = usize::from(self.channels) - 1;
        self.samples[channel.min(last)]
    }

    /// Convert a sample to the `[-1.0, 1.0]` float range.
    pub fn to_f32(sample: i16) -> f32 {
        f32::from(sample) / 32768.0
    }
}

impl Default for AudioFrame {
    fn default() -> Self {
        Self::mono(0)
    }
}

impl From<i16> for AudioFrame {
    fn from(sample: i16) -> Self {
        Self::mono(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_frame() {
        let frame = AudioFrame::mono(i16::MAX);
        assert_eq!(frame.samples(), &[i16::MAX]);
        assert_eq!(frame.channels(), 1);
        assert_eq!(frame.sample_for(1), i16::MAX);
    }

    #[test]
    fn test_stereo_sample_for() {
        let frame = AudioFrame::stereo(i16::MIN, i16::MAX);
        assert_eq!(frame.sample_for(0), i16::MIN);
        assert_eq!(frame.sample_for(5), i16::MAX);
    }

    #[test]
    fn test_from_samples() {
        assert_eq!(AudioFrame::from_samples(&[7]), Some(AudioFrame::mono(7)));
        assert_eq!(
            AudioFrame::from_samples(&[1, 2]),
            Some(AudioFrame::stereo(1, 2))
        );
        assert_eq!(AudioFrame::from_samples(&[]), None);
        assert_eq!(AudioFrame::from_samples(&[1, 2, 3]), None);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_to_f32_range() {
        assert_eq!(AudioFrame::to_f32(i16::MIN), -1.0);
        assert_eq!(AudioFrame::to_f32(0), 0.0);
        assert!(AudioFrame::to_f32(i16::MAX) < 1.0);
    }
}
