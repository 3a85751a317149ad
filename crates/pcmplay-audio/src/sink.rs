//! Audio sinks: the consumer side of the playback buffer.
//!
//! A sink pulls frames from the shared buffer on its own clock. It talks back
//! to the controller only through [`SinkEvent`]s and never calls into it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use pcmplay_core::{AudioFrame, Error, PcmDescriptor, Result};
use tracing::{debug, trace, warn};

use crate::buffer::SharedPlaybackBuffer;

/// Notifications from a running sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// The sink asked for audio and the buffer was empty.
    Drained,
    /// The output reported a runtime failure.
    Error(String),
}

/// Everything a sink needs to start pulling audio.
#[derive(Debug, Clone)]
pub struct SinkContext {
    pub buffer: SharedPlaybackBuffer,
    pub events: Sender<SinkEvent>,
    pub descriptor: PcmDescriptor,
}

/// An output that drains the playback buffer in real time.
pub trait AudioSink: Send {
    /// Acquire the output and begin pulling, or resume after [`pause`].
    ///
    /// Fails with [`Error::SinkUnavailable`] when the output cannot be opened.
    ///
    /// [`pause`]: AudioSink::pause
    fn start(&mut self, ctx: SinkContext) -> Result<()>;

    /// Stop pulling frames but keep the output open.
    fn pause(&mut self);

    /// Stop pulling and release the output. Safe to call in any state.
    fn stop(&mut self);

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Turns underrun observations into a single `Drained` event per dry spell.
#[derive(Debug, Default)]
pub struct DrainTracker {
    reported: bool,
}

impl DrainTracker {
    /// Record one pull. Sends `Drained` the first time a pull finds nothing.
    pub fn observe(&mut self, read: usize, underrun: bool, events: &Sender<SinkEvent>) {
        if read > 0 {
            self.reported = false;
            return;
        }
        if underrun && !self.reported {
            self.reported = true;
            let _ = events.try_send(SinkEvent::Drained);
        }
    }
}

/// Shared record of every frame a [`ClockSink`] consumed.
#[derive(Debug, Clone, Default)]
pub struct FrameCapture(Arc<Mutex<Vec<AudioFrame>>>);

impl FrameCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn extend(&self, frames: &[AudioFrame]) {
        self.0.lock().extend_from_slice(frames);
    }

    /// Snapshot of the captured frames.
    pub fn frames(&self) -> Vec<AudioFrame> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct ClockWorker {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Headless sink that consumes audio on a timer instead of a device callback.
///
/// Every `tick` it pops the frames one tick of audio covers, so a stream
/// plays for its natural duration.
pub struct ClockSink {
    tick: Duration,
    frames_per_tick: Option<usize>,
    capture: Option<FrameCapture>,
    worker: Option<ClockWorker>,
}

impl ClockSink {
    pub const fn new(tick: Duration) -> Self {
        Self {
            tick,
            frames_per_tick: None,
            capture: None,
            worker: None,
        }
    }

    /// Override how many frames each tick consumes.
    pub fn with_frames_per_tick(mut self, frames: usize) -> Self {
        self.frames_per_tick = Some(frames);
        self
    }

    /// Record consumed frames into `capture`.
    pub fn with_capture(mut self, capture: FrameCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    fn spawn(&self, ctx: SinkContext) -> Result<ClockWorker> {
        let tick = self.tick;
        let per_tick = self
            .frames_per_tick
            .unwrap_or_else(|| ctx.descriptor.frames_in(tick))
            .max(1);
        let capture = self.capture.clone();
        let running = Arc::new(AtomicBool::new(true));
        let paused = Arc::new(AtomicBool::new(false));
        let running_flag = running.clone();
        let paused_flag = paused.clone();

        let handle = std::thread::Builder::new()
            .name("pcm-clock-sink".to_string())
            .spawn(move || {
                debug!("Clock sink started: {per_tick} frames every {tick:?}");
                let mut scratch = vec![AudioFrame::default(); per_tick];
                let mut drain = DrainTracker::default();

                while running_flag.load(Ordering::Acquire) {
                    if paused_flag.load(Ordering::Acquire) {
                        std::thread::park_timeout(tick);
                        continue;
                    }

                    let (read, underrun) = ctx.buffer.pop_into(&mut scratch);
                    if let Some(capture) = &capture {
                        capture.extend(&scratch[..read]);
                    }
                    if underrun && read > 0 {
                        trace!("Clock sink short read: needed {per_tick}, got {read}");
                    }
                    drain.observe(read, underrun, &ctx.events);

                    std::thread::park_timeout(tick);
                }
                debug!("Clock sink stopped");
            })
            .map_err(|e| Error::SinkUnavailable(format!("Failed to spawn clock thread: {e}")))?;

        Ok(ClockWorker {
            running,
            paused,
            handle,
        })
    }
}

impl Default for ClockSink {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_TICK_MS))
    }
}

impl AudioSink for ClockSink {
    fn start(&mut self, ctx: SinkContext) -> Result<()> {
        if let Some(worker) = &self.worker {
            worker.paused.store(false, Ordering::Release);
            worker.handle.thread().unpark();
            return Ok(());
        }
        self.worker = Some(self.spawn(ctx)?);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(worker) = &self.worker {
            worker.paused.store(true, Ordering::Release);
        }
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.running.store(false, Ordering::Release);
            worker.handle.thread().unpark();
            if worker.handle.join().is_err() {
                warn!("Clock sink thread panicked");
            }
        }
    }

    fn name(&self) -> &str {
        "clock"
    }
}

impl Drop for ClockSink {
    fn drop(&mut self) {
        self.stop();
    }
}
