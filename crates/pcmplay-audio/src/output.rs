//! Audio output using cpal.

use std::collections::VecDeque;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, SampleFormat, SampleRate, Stream, StreamConfig,
};
use pcmplay_core::{AudioFrame, Error, PcmDescriptor, Result};
use tracing::{debug, error, info, warn};

use crate::buffer::SharedPlaybackBuffer;
use crate::resample::Resampler;
use crate::sink::{AudioSink, DrainTracker, SinkContext, SinkEvent};

/// How long `start` waits for the device thread to open the stream.
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

enum DeviceCommand {
    Play,
    Pause,
}

struct DeviceWorker {
    control: Sender<DeviceCommand>,
    handle: JoinHandle<()>,
}

/// Sink that plays through the default cpal output device.
///
/// `cpal::Stream` is not `Send`, so the stream lives on its own thread and
/// this handle drives it over a channel.
#[derive(Default)]
pub struct CpalSink {
    device_name: Option<String>,
    worker: Option<DeviceWorker>,
}

impl CpalSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn(ctx: SinkContext) -> Result<(DeviceWorker, String)> {
        let (control, control_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        let handle = std::thread::Builder::new()
            .name("pcm-sink".to_string())
            .spawn(move || run_device(ctx, &control_rx, &ready_tx))
            .map_err(|e| Error::SinkUnavailable(format!("Failed to spawn sink thread: {e}")))?;

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(device_name)) => Ok((DeviceWorker { control, handle }, device_name)),
            Ok(Err(message)) => {
                let _ = handle.join();
                Err(Error::SinkUnavailable(message))
            }
            Err(_) => Err(Error::SinkUnavailable(
                "Timed out opening output device".to_string(),
            )),
        }
    }
}

impl AudioSink for CpalSink {
    fn start(&mut self, ctx: SinkContext) -> Result<()> {
        if let Some(worker) = &self.worker {
            if worker.control.send(DeviceCommand::Play).is_ok() {
                return Ok(());
            }
            // The device thread is gone; reopen below.
            self.stop();
        }

        let (worker, device_name) = Self::spawn(ctx)?;
        self.device_name = Some(device_name);
        self.worker = Some(worker);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(worker) = &self.worker {
            let _ = worker.control.send(DeviceCommand::Pause);
        }
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            // Dropping the sender ends the device thread's command loop.
            drop(worker.control);
            if worker.handle.join().is_err() {
                warn!("Audio output thread panicked");
            }
        }
    }

    fn name(&self) -> &str {
        self.device_name.as_deref().unwrap_or("cpal")
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the device thread: open, report, then obey commands until closed.
fn run_device(
    ctx: SinkContext,
    control: &Receiver<DeviceCommand>,
    ready: &Sender<std::result::Result<String, String>>,
) {
    let stream = match open_stream(ctx) {
        Ok((stream, device_name)) => {
            let _ = ready.send(Ok(device_name));
            stream
        }
        Err(e) => {
            error!("Failed to open audio output: {e}");
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    while let Ok(command) = control.recv() {
        let result = match command {
            DeviceCommand::Play => stream.play().map_err(|e| e.to_string()),
            DeviceCommand::Pause => stream.pause().map_err(|e| e.to_string()),
        };
        if let Err(e) = result {
            warn!("Audio stream control failed: {e}");
        }
    }
    debug!("Audio output closed");
}

fn open_stream(ctx: SinkContext) -> Result<(Stream, String)> {
    let host = cpal::default_host();

    let device = host
        .default_output_device()
        .ok_or_else(|| Error::SinkUnavailable("No output device found".to_string()))?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("Using audio output device: {device_name}");

    let (config, sample_format) = choose_config(&device, &ctx.descriptor)?;
    debug!(
        "Output config: {}Hz, {} channels, {:?}",
        config.sample_rate.0, config.channels, sample_format
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, ctx)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, ctx)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, ctx)?,
        _ => {
            return Err(Error::SinkUnavailable(format!(
                "Unsupported sample format: {sample_format:?}"
            )));
        }
    };

    stream
        .play()
        .map_err(|e| Error::SinkUnavailable(format!("Failed to start stream: {e}")))?;

    Ok((stream, device_name))
}

/// Prefer a device config that runs at the stream rate, so no resampling is
/// needed; fall back to the device default.
fn choose_config(device: &Device, descriptor: &PcmDescriptor) -> Result<(StreamConfig, SampleFormat)> {
    let rate = SampleRate(descriptor.sample_rate());

    if let Ok(ranges) = device.supported_output_configs() {
        let mut native: Vec<_> = ranges
            .filter(|r| r.min_sample_rate() <= rate && rate <= r.max_sample_rate())
            .collect();
        native.sort_by_key(|r| r.channels() != descriptor.channels());
        if let Some(range) = native.into_iter().next() {
            let supported = range.with_sample_rate(rate);
            return Ok((supported.config(), supported.sample_format()));
        }
    }

    let supported = device
        .default_output_config()
        .map_err(|e| Error::SinkUnavailable(format!("Failed to get output config: {e}")))?;
    Ok((supported.config(), supported.sample_format()))
}

fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    ctx: SinkContext,
) -> Result<Stream> {
    let error_events = ctx.events.clone();
    let err_fn = move |err: cpal::StreamError| {
        error!("Audio stream error: {err}");
        let _ = error_events.try_send(SinkEvent::Error(err.to_string()));
    };

    let mut pull = DevicePull::new(ctx, config.sample_rate.0, usize::from(config.channels))?;
    let mut mix = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                mix.resize(data.len(), 0.0f32);
                pull.fill(&mut mix);
                for (sample, &value) in data.iter_mut().zip(mix.iter()) {
                    *sample = T::from_sample(value);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| Error::SinkUnavailable(format!("Failed to build stream: {e}")))
}

/// Callback-side state: pulls frames, converts rate, maps channels.
struct DevicePull {
    buffer: SharedPlaybackBuffer,
    events: Sender<SinkEvent>,
    resampler: Resampler,
    scratch: Vec<AudioFrame>,
    planes: Vec<Vec<f32>>,
    /// Interleaved device-rate samples not yet handed to the device.
    pending: VecDeque<f32>,
    device_channels: usize,
    drain: DrainTracker,
}

impl DevicePull {
    fn new(ctx: SinkContext, device_rate: u32, device_channels: usize) -> Result<Self> {
        let source_channels = usize::from(ctx.descriptor.channels());
        let resampler = Resampler::new(ctx.descriptor.sample_rate(), device_rate, source_channels)?;
        Ok(Self {
            buffer: ctx.buffer,
            events: ctx.events,
            resampler,
            scratch: Vec::new(),
            planes: vec![Vec::new(); source_channels],
            pending: VecDeque::new(),
            device_channels: device_channels.max(1),
            drain: DrainTracker::default(),
        })
    }

    /// Fill `out` with interleaved device samples, padding with silence.
    fn fill(&mut self, out: &mut [f32]) {
        let mut written = 0;
        while written < out.len() {
            if self.pending.is_empty() && !self.refill() {
                break;
            }
            let take = self.pending.len().min(out.len() - written);
            for (dst, sample) in out[written..written + take]
                .iter_mut()
                .zip(self.pending.drain(..take))
            {
                *dst = sample;
            }
            written += take;
        }

        if written < out.len() && written > 0 {
            warn!(
                "Buffer underrun: needed {}, got {}",
                out.len(),
                written
            );
        }
        out[written..].fill(0.0);
    }

    /// Convert one chunk from the playback buffer. False when nothing was read.
    fn refill(&mut self) -> bool {
        let need = self.resampler.input_frames_next();
        self.scratch.resize(need, AudioFrame::default());

        let (read, underrun) = self.buffer.pop_into(&mut self.scratch);
        self.drain.observe(read, underrun, &self.events);
        if read == 0 {
            return false;
        }

        for (channel, plane) in self.planes.iter_mut().enumerate() {
            plane.clear();
            plane.extend(
                self.scratch[..read]
                    .iter()
                    .map(|f| AudioFrame::to_f32(f.sample_for(channel))),
            );
            // The resampler takes fixed chunks; pad short reads with silence.
            if self.resampler.needs_resampling() {
                plane.resize(need, 0.0);
            }
        }

        let frames = match self.resampler.process(&self.planes) {
            Ok(frames) => frames,
            Err(e) => {
                let _ = self.events.try_send(SinkEvent::Error(e.to_string()));
                return false;
            }
        };

        let output = self.resampler.output();
        for frame in 0..frames {
            for channel in 0..self.device_channels {
                self.pending
                    .push_back(map_channel(output, frame, channel, self.device_channels));
            }
        }
        true
    }
}

/// Sample for device channel `channel` from planar source audio.
///
/// A mono device gets the average of all source channels; wider devices reuse
/// the last source channel.
fn map_channel(planes: &[Vec<f32>], frame: usize, channel: usize, device_channels: usize) -> f32 {
    if device_channels == 1 && planes.len() > 1 {
        let sum: f32 = planes.iter().map(|p| p[frame]).sum();
        return sum / planes.len() as f32;
    }
    planes[channel.min(planes.len() - 1)][frame]
}

/// List available output devices.
pub fn list_output_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();

    let devices: Vec<String> = host
        .output_devices()
        .map_err(|e| Error::SinkUnavailable(format!("Failed to list devices: {e}")))?
        .filter_map(|d| d.name().ok())
        .collect();

    Ok(devices)
}

/// Get the default output device name.
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}
