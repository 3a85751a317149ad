//! Interpret raw bytes as s16le audio frames.

use std::iter::FusedIterator;

use pcmplay_core::{AudioFrame, Error, PcmDescriptor, Result};

/// Check alignment and return how many frames `bytes` holds.
pub fn frame_count(bytes: &[u8], descriptor: &PcmDescriptor) -> Result<usize> {
    let alignment = descriptor.bytes_per_frame();
    if bytes.len() % alignment != 0 {
        return Err(Error::MalformedStream {
            len: bytes.len(),
            alignment,
        });
    }
    Ok(bytes.len() / alignment)
}

/// Frame `bytes` according to `descriptor`.
///
/// Fails with [`Error::MalformedStream`] if the input ends in a partial frame.
/// The returned iterator borrows `bytes` and decodes lazily.
pub fn frame<'a>(bytes: &'a [u8], descriptor: &PcmDescriptor) -> Result<Frames<'a>> {
    frame_count(bytes, descriptor)?;
    Ok(Frames {
        chunks: bytes.chunks_exact(descriptor.bytes_per_frame()),
        channels: usize::from(descriptor.channels()),
    })
}

/// Lazy, finite sequence of frames over a byte slice.
///
/// Cloning restarts from the clone point; the source bytes are never copied.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    chunks: std::slice::ChunksExact<'a, u8>,
    channels: usize,
}

impl Frames<'_> {
    fn decode(&self, chunk: &[u8]) -> AudioFrame {
        let mut samples = [0i16; pcmplay_core::MAX_CHANNELS];
        for (slot, pair) in samples.iter_mut().zip(chunk.chunks_exact(2)) {
            *slot = i16::from_le_bytes([pair[0], pair[1]]);
        }
        AudioFrame::from_samples(&samples[..self.channels]).unwrap_or_default()
    }
}

impl Iterator for Frames<'_> {
    type Item = AudioFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        Some(self.decode(chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Frames<'_> {}

impl FusedIterator for Frames<'_> {}
