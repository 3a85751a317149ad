//! WAV container helpers using hound.
//!
//! The browser frontend plays PCM by prefixing it with a canonical 44-byte
//! RIFF/WAVE header; `encode_wav` produces the same layout.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat as WavSampleFormat, WavReader, WavSpec, WavWriter};
use pcmplay_core::{Error, PcmDescriptor, Result};
use tracing::debug;

use crate::framer;

fn spec_for(descriptor: &PcmDescriptor) -> WavSpec {
    WavSpec {
        channels: descriptor.channels(),
        sample_rate: descriptor.sample_rate(),
        bits_per_sample: descriptor.format().bits_per_sample(),
        sample_format: WavSampleFormat::Int,
    }
}

fn wav_err(e: hound::Error) -> Error {
    Error::Wav(e.to_string())
}

fn write_samples<W>(writer: &mut WavWriter<W>, pcm: &[u8], descriptor: &PcmDescriptor) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    for frame in framer::frame(pcm, descriptor)? {
        for &sample in frame.samples() {
            writer.write_sample(sample).map_err(wav_err)?;
        }
    }
    Ok(())
}

/// Wrap raw s16le PCM in a WAV container.
pub fn encode_wav(pcm: &[u8], descriptor: &PcmDescriptor) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len()));
    {
        let mut writer = WavWriter::new(&mut cursor, spec_for(descriptor)).map_err(wav_err)?;
        write_samples(&mut writer, pcm, descriptor)?;
        writer.finalize().map_err(wav_err)?;
    }
    Ok(cursor.into_inner())
}

/// Write raw s16le PCM to a WAV file.
pub fn write_wav_file(path: impl AsRef<Path>, pcm: &[u8], descriptor: &PcmDescriptor) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WavWriter::create(path, spec_for(descriptor)).map_err(wav_err)?;
    write_samples(&mut writer, pcm, descriptor)?;
    writer.finalize().map_err(wav_err)?;
    debug!("Wrote {} PCM bytes to {}", pcm.len(), path.display());
    Ok(())
}

/// Extract s16le PCM from a 16-bit integer WAV file.
///
/// Returns the file's format alongside the raw bytes so the caller can check
/// it against the stream format.
pub fn pcm_from_wav(data: &[u8]) -> Result<(PcmDescriptor, Vec<u8>)> {
    let mut reader = WavReader::new(Cursor::new(data)).map_err(wav_err)?;
    let spec = reader.spec();
    if spec.sample_format != WavSampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(Error::InvalidArgument(format!(
            "expected 16-bit integer WAV, got {} bits {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }
    let descriptor = PcmDescriptor::new(spec.sample_rate, spec.channels)?;

    let mut pcm = Vec::with_capacity(reader.len() as usize * 2);
    for sample in reader.samples::<i16>() {
        pcm.extend_from_slice(&sample.map_err(wav_err)?.to_le_bytes());
    }
    Ok((descriptor, pcm))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_header_layout() {
        let pcm = [0x00, 0x00, 0xff, 0x7f];
        let wav = encode_wav(&pcm, &PcmDescriptor::STREAM).unwrap();

        assert_eq!(wav.len(), 44 + pcm.len());
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 36 + 4);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([wav[20], wav[21]]), 1); // PCM
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1); // mono
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 16_000);
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 32_000);
        assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 2); // block align
        assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 4);
        assert_eq!(&wav[44..], &pcm);
    }

    #[test]
    fn test_rejects_partial_sample() {
        assert!(matches!(
            encode_wav(&[1], &PcmDescriptor::STREAM),
            Err(Error::MalformedStream { .. })
        ));
    }

    #[test]
    fn test_pcm_from_wav() {
        let pcm: Vec<u8> = [1i16, -2, 300].iter().flat_map(|s| s.to_le_bytes()).collect();
        let wav = encode_wav(&pcm, &PcmDescriptor::STREAM).unwrap();

        let (descriptor, extracted) = pcm_from_wav(&wav).unwrap();
        assert_eq!(descriptor, PcmDescriptor::STREAM);
        assert_eq!(extracted, pcm);
    }

    #[test]
    fn test_write_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav_file(&path, &[0, 0, 1, 0], &PcmDescriptor::STREAM).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 48);
        assert_eq!(pcm_from_wav(&data).unwrap().1, vec![0, 0, 1, 0]);
    }

    #[test]
    fn test_garbage_is_not_wav() {
        assert!(matches!(pcm_from_wav(b"not a wav"), Err(Error::Wav(_))));
    }
}
