//! Subcommand implementations.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use pcmplay_audio::output::{default_device_name, list_output_devices};
use pcmplay_audio::{transport, wav, PlaybackController};
use pcmplay_bridge::channel::serve;
use pcmplay_bridge::{ComponentDeclaration, HostBridge};
use pcmplay_core::{PcmDescriptor, PlaybackState};
use tracing::{info, warn};

use crate::cli::{PlayerArgs, SourceArgs};

/// Extra time allowed past the buffered audio before giving up on playback.
const FINISH_GRACE: Duration = Duration::from_secs(2);

/// Read a file as raw stream PCM.
///
/// Base64 text is decoded; WAV files are unwrapped and must already be in the
/// stream format.
fn read_pcm(path: &Path, base64: bool) -> Result<Vec<u8>> {
    if base64 {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        return Ok(transport::decode(&text)?);
    }

    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if !data.starts_with(b"RIFF") {
        return Ok(data);
    }

    let (descriptor, pcm) = wav::pcm_from_wav(&data)?;
    if descriptor != PcmDescriptor::STREAM {
        bail!(
            "{} is {} Hz with {} channel(s); expected 16000 Hz mono",
            path.display(),
            descriptor.sample_rate(),
            descriptor.channels()
        );
    }
    Ok(pcm)
}

pub fn play(args: &PlayerArgs, path: &Path, base64: bool, chunk_ms: u64) -> Result<()> {
    let pcm = read_pcm(path, base64)?;
    let config = args.player_config()?;
    let descriptor = config.descriptor();
    let mut controller = PlaybackController::new(config);

    let bytes_per_frame = descriptor.bytes_per_frame();
    let chunk_frames = descriptor
        .frames_in(Duration::from_millis(chunk_ms.max(1)))
        .clamp(1, controller.buffer().capacity());
    info!(
        "Playing {} ({:.2}s) in {chunk_frames}-frame chunks",
        path.display(),
        descriptor.duration_of(pcm.len() / bytes_per_frame).as_secs_f64()
    );

    for chunk in pcm.chunks(chunk_frames * bytes_per_frame) {
        let needed = chunk.len() / bytes_per_frame;
        while controller.state() == PlaybackState::Playing && controller.buffer().free() < needed {
            controller.wait_event(Duration::from_millis(5));
        }

        controller
            .load(&transport::encode(chunk), false)
            .context("buffering audio")?;
        if controller.state() == PlaybackState::Ready {
            controller.play().context("starting playback")?;
        }
    }

    let remaining = descriptor.duration_of(controller.buffered()) + FINISH_GRACE;
    let state = controller.wait_until_finished(remaining);
    if state == PlaybackState::Playing {
        warn!("Playback did not finish within {remaining:?}, stopping");
        controller.stop();
    }
    info!(
        "Done: {} ({} frames dropped, {} underruns)",
        controller.status().value(),
        controller.buffer().dropped_total(),
        controller.buffer().underruns_total()
    );
    Ok(())
}

pub fn export_wav(input: &Path, output: &Path, base64: bool) -> Result<()> {
    let pcm = read_pcm(input, base64)?;
    wav::write_wav_file(output, &pcm, &PcmDescriptor::STREAM)
        .with_context(|| format!("writing {}", output.display()))?;
    info!("Wrote {} ({} bytes of PCM)", output.display(), pcm.len());
    Ok(())
}

pub fn declare(args: &PlayerArgs, source: &SourceArgs, check: bool) -> Result<()> {
    let source = match source.source() {
        Some(source) => source,
        None => args.bridge_config()?.source,
    };
    if check {
        source.check()?;
    }
    let declaration = ComponentDeclaration::new(source);
    println!("{}", serde_json::to_string_pretty(&declaration)?);
    Ok(())
}

pub fn bridge(args: &PlayerArgs, source: &SourceArgs) -> Result<()> {
    let mut config = args.bridge_config()?;
    if let Some(source) = source.source() {
        config.source = source;
    }
    let bridge = HostBridge::new(config);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    serve(&bridge, stdin.lock(), stdout.lock())?;
    Ok(())
}

pub fn devices() -> Result<()> {
    let default = default_device_name();
    for name in list_output_devices()? {
        let marker = if default.as_deref() == Some(name.as_str()) { "*" } else { " " };
        println!("{marker} {name}");
    }
    Ok(())
}
