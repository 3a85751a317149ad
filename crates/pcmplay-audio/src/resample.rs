//! Stream-rate to device-rate conversion, using rubato.

use pcmplay_core::{Error, Result};
use rubato::{FftFixedIn, Resampler as _};
use tracing::debug;

/// Input frames consumed per conversion step (16 ms at 16 kHz).
pub const CHUNK_FRAMES: usize = 256;

/// Planar converter fed one fixed chunk at a time.
///
/// When the device already runs at the stream rate there is no rubato
/// instance and chunks are copied through untouched.
pub struct Resampler {
    fft: Option<FftFixedIn<f32>>,
    source_rate: u32,
    device_rate: u32,
    planes: Vec<Vec<f32>>,
}

impl Resampler {
    pub fn new(source_rate: u32, device_rate: u32, channels: usize) -> Result<Self> {
        if source_rate == device_rate {
            return Ok(Self {
                fft: None,
                source_rate,
                device_rate,
                planes: vec![Vec::with_capacity(CHUNK_FRAMES); channels],
            });
        }

        let fft = FftFixedIn::new(
            source_rate as usize,
            device_rate as usize,
            CHUNK_FRAMES,
            2,
            channels,
        )
        .map_err(|e| Error::SinkUnavailable(format!("Cannot convert {source_rate}Hz to {device_rate}Hz: {e}")))?;
        let planes = fft.output_buffer_allocate(true);
        debug!("Converting {source_rate}Hz -> {device_rate}Hz over {channels} channel(s)");

        Ok(Self {
            fft: Some(fft),
            source_rate,
            device_rate,
            planes,
        })
    }

    pub const fn needs_resampling(&self) -> bool {
        self.source_rate != self.device_rate
    }

    /// Frames per channel the next [`process`](Self::process) call expects.
    pub fn input_frames_next(&self) -> usize {
        self.fft.as_ref().map_or(CHUNK_FRAMES, |fft| fft.input_frames_next())
    }

    /// Convert one planar chunk and return the number of frames now readable
    /// through [`output`](Self::output).
    ///
    /// When converting, every plane must hold exactly
    /// [`input_frames_next`](Self::input_frames_next) frames.
    pub fn process(&mut self, input: &[Vec<f32>]) -> Result<usize> {
        let Some(fft) = self.fft.as_mut() else {
            for (out, plane) in self.planes.iter_mut().zip(input) {
                out.clear();
                out.extend_from_slice(plane);
            }
            return Ok(input.first().map_or(0, Vec::len));
        };

        let (_, written) = fft
            .process_into_buffer(input, self.planes.as_mut_slice(), None)
            .map_err(|e| Error::Internal(format!("Resample failed: {e}")))?;
        Ok(written)
    }

    pub fn output(&self) -> &[Vec<f32>] {
        &self.planes
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_matching_rates_copy_through() {
        let mut resampler = Resampler::new(16_000, 16_000, 1).unwrap();
        assert!(!resampler.needs_resampling());

        // Short chunks are fine without conversion
        let input = vec![vec![0.5f32; 10]];
        assert_eq!(resampler.process(&input).unwrap(), 10);
        assert_eq!(resampler.output()[0], input[0]);
    }

    #[test]
    fn test_upsample_to_device_rate() {
        let mut resampler = Resampler::new(16_000, 48_000, 2).unwrap();
        assert!(resampler.needs_resampling());

        let mut total = 0;
        for _ in 0..8 {
            let frames = resampler.input_frames_next();
            let chunk = vec![vec![0.25f32; frames]; 2];
            total += resampler.process(&chunk).unwrap();
        }
        assert!(total > 0);
        assert!(total <= 8 * CHUNK_FRAMES * 3);
    }
}
