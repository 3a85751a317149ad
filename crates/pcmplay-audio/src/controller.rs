//! Playback controller: the state machine that owns the playback buffer.
//!
//! Payloads are decoded and framed synchronously on the caller's thread, then
//! appended to the buffer while the sink keeps draining it on its own clock.
//! Every state change is published as a [`StatusCode`].

use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use pcmplay_core::{AudioFrame, Error, PcmDescriptor, PlaybackState, Result, StatusCode};
use tracing::{debug, error, info, warn};

use crate::buffer::{shared_playback_buffer, SharedPlaybackBuffer};
use crate::config::PlayerConfig;
use crate::framer;
use crate::sink::{AudioSink, SinkContext, SinkEvent};
use crate::transport;

/// State machine driving one player.
pub struct PlaybackController {
    config: PlayerConfig,
    buffer: SharedPlaybackBuffer,
    sink: Box<dyn AudioSink>,
    /// The sink has been started and not stopped since (it may be paused).
    sink_open: bool,
    state: PlaybackState,
    /// Last value reported to subscribers.
    status: StatusCode,
    sink_tx: Sender<SinkEvent>,
    sink_rx: Receiver<SinkEvent>,
    subscribers: Vec<Sender<StatusCode>>,
    /// The sink ran dry while playing; the stream ends at this instant unless
    /// more audio arrives first.
    pending_end: Option<Instant>,
}

impl PlaybackController {
    /// Create a controller using the sink named in `config`.
    pub fn new(config: PlayerConfig) -> Self {
        let sink = config.sink.build();
        Self::with_sink(config, sink)
    }

    /// Create a controller draining into a caller-provided sink.
    pub fn with_sink(config: PlayerConfig, sink: Box<dyn AudioSink>) -> Self {
        let (sink_tx, sink_rx) = unbounded();
        let buffer = shared_playback_buffer(config.buffer_capacity);
        debug!(
            "Playback controller created: {} frame buffer ({:?}), sink {}",
            buffer.capacity(),
            config.buffer_duration(),
            sink.name()
        );

        Self {
            config,
            buffer,
            sink,
            sink_open: false,
            state: PlaybackState::Idle,
            status: StatusCode::IDLE,
            sink_tx,
            sink_rx,
            subscribers: Vec::new(),
            pending_end: None,
        }
    }

    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Last value reported: the current state or the most recent error.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub const fn descriptor(&self) -> PcmDescriptor {
        self.config.descriptor()
    }

    /// Frames waiting to be played.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub const fn buffer(&self) -> &SharedPlaybackBuffer {
        &self.buffer
    }

    /// Receive every status change from now on.
    pub fn subscribe(&mut self) -> Receiver<StatusCode> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Decode a base64 payload and buffer its frames.
    ///
    /// With `reset` the current stream is replaced, otherwise the frames are
    /// appended to it. A payload that fails to decode leaves the buffer as it
    /// was and returns the session to `Idle`.
    pub fn load(&mut self, payload: &str, reset: bool) -> Result<usize> {
        self.pump();

        let resume = match self.state {
            PlaybackState::Playing | PlaybackState::Paused => Some(self.state),
            _ => None,
        };
        self.transition(PlaybackState::Loading);

        let frames = match self.decode_payload(payload) {
            Ok(frames) => frames,
            Err(e) => return Err(self.abort_load(e)),
        };

        if reset {
            debug!("Resetting stream, discarding {} buffered frames", self.buffer.len());
            self.buffer.clear();
        }
        let outcome = self.buffer.push_slice(&frames);
        if self.pending_end.take().is_some() {
            debug!("More audio arrived before the stream ended");
        }
        if outcome.dropped > 0 {
            warn!(
                "Playback buffer overflow: dropped {} oldest frames",
                outcome.dropped
            );
        }
        debug!(
            "Buffered {} frames ({} total)",
            outcome.written,
            self.buffer.len()
        );

        match resume {
            Some(state) => self.transition(state),
            None => {
                self.transition(PlaybackState::Ready);
                if self.config.autoplay {
                    self.play()?;
                }
            }
        }
        Ok(frames.len())
    }

    fn decode_payload(&self, payload: &str) -> Result<Vec<AudioFrame>> {
        let bytes = transport::decode(payload)?;
        let frames: Vec<AudioFrame> = framer::frame(&bytes, &self.descriptor())?.collect();
        if frames.is_empty() {
            return Err(Error::EmptyStream);
        }
        Ok(frames)
    }

    fn abort_load(&mut self, err: Error) -> Error {
        warn!("Rejected payload: {err}");
        if self.sink_open {
            self.sink.pause();
        }
        self.transition(PlaybackState::Idle);
        self.emit(StatusCode::from(&err));
        err
    }

    /// Start or resume the sink. Ignored unless `Ready` or `Paused`.
    pub fn play(&mut self) -> Result<()> {
        self.pump();

        match self.state {
            PlaybackState::Ready | PlaybackState::Paused => {}
            PlaybackState::Playing => return Ok(()),
            other => {
                debug!("Ignoring play while {other}");
                return Ok(());
            }
        }

        let ctx = SinkContext {
            buffer: self.buffer.clone(),
            events: self.sink_tx.clone(),
            descriptor: self.descriptor(),
        };
        if let Err(e) = self.sink.start(ctx) {
            error!("Failed to start {} sink: {e}", self.sink.name());
            self.sink.stop();
            self.sink_open = false;
            self.transition(PlaybackState::Idle);
            self.emit(StatusCode::from(&e));
            return Err(e);
        }

        self.sink_open = true;
        self.transition(PlaybackState::Playing);
        // A sink resumed on an empty buffer reports no new drain.
        if self.buffer.is_empty() {
            self.arm_end();
        }
        Ok(())
    }

    /// Suspend the sink, keeping buffered audio. Ignored unless `Playing`.
    pub fn pause(&mut self) {
        self.pump();

        if self.state == PlaybackState::Playing {
            self.sink.pause();
            self.transition(PlaybackState::Paused);
        } else {
            debug!("Ignoring pause while {}", self.state);
        }
    }

    /// Halt the sink and discard buffered audio. Safe from any state.
    pub fn stop(&mut self) {
        self.halt();
        self.transition(PlaybackState::Stopped);
    }

    fn halt(&mut self) {
        self.pending_end = None;
        self.sink.stop();
        self.sink_open = false;
        self.buffer.clear();
        // Events from the stopped sink no longer describe this stream.
        while self.sink_rx.try_recv().is_ok() {}
    }

    /// Apply every pending sink event, then end the stream if it has been
    /// dry for the whole grace window.
    pub fn pump(&mut self) {
        while let Ok(event) = self.sink_rx.try_recv() {
            self.handle_sink_event(event);
        }
        self.check_end();
    }

    fn arm_end(&mut self) {
        if self.pending_end.is_none() {
            self.pending_end = Some(Instant::now() + self.config.end_grace());
        }
    }

    fn check_end(&mut self) {
        let Some(deadline) = self.pending_end else {
            return;
        };
        if self.state != PlaybackState::Playing {
            return;
        }
        if !self.buffer.is_empty() {
            self.pending_end = None;
        } else if Instant::now() >= deadline {
            info!(
                "Playback finished ({} frames dropped, {} underruns)",
                self.buffer.dropped_total(),
                self.buffer.underruns_total()
            );
            self.halt();
            self.transition(PlaybackState::Stopped);
        }
    }

    /// Block up to `timeout` for a sink event, then apply it and any others
    /// queued behind it. Returns false on timeout.
    pub fn wait_event(&mut self, timeout: Duration) -> bool {
        match self.sink_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_sink_event(event);
                self.pump();
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Wait until playback leaves `Playing` or `timeout` elapses.
    ///
    /// Returns the state at that point.
    pub fn wait_until_finished(&mut self, timeout: Duration) -> PlaybackState {
        let deadline = Instant::now() + timeout;
        self.pump();
        while self.state == PlaybackState::Playing {
            let now = Instant::now();
            let remaining = deadline.saturating_duration_since(now);
            if remaining.is_zero() {
                break;
            }
            let wake = self
                .pending_end
                .map_or(remaining, |end| end.saturating_duration_since(now).min(remaining));
            if !self.wait_event(wake) {
                self.pump();
            }
        }
        self.state
    }

    fn handle_sink_event(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::Drained => {
                if self.state == PlaybackState::Playing && self.buffer.is_empty() {
                    debug!(
                        "Sink drained, ending in {:?} unless more audio arrives",
                        self.config.end_grace()
                    );
                    self.arm_end();
                }
            }
            SinkEvent::Error(message) => {
                error!("Audio sink failed: {message}");
                let err = Error::SinkUnavailable(message);
                self.sink.stop();
                self.sink_open = false;
                self.transition(PlaybackState::Idle);
                self.emit(StatusCode::from(&err));
            }
        }
    }

    fn transition(&mut self, next: PlaybackState) {
        let previous = self.state;
        self.state = next;
        if next != PlaybackState::Playing {
            self.pending_end = None;
        }
        if previous != next {
            debug!("State changed: {previous:?} -> {next:?}");
            self.emit(StatusCode::State(next));
        }
    }

    fn emit(&mut self, status: StatusCode) {
        self.status = status;
        self.subscribers.retain(|tx| tx.send(status).is_ok());
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
