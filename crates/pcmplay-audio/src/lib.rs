//! # pcmplay-audio
//!
//! Streaming playback engine for raw s16le PCM.
//!
//! Features:
//! - base64 transport decoding and s16le framing
//! - Bounded drop-oldest playback buffer between producer and sink
//! - Low-latency cpal output, or a clock-paced headless sink
//! - Playback state machine reporting numeric status codes

pub mod buffer;
pub mod config;
pub mod controller;
pub mod framer;
pub mod output;
pub mod resample;
pub mod sink;
pub mod transport;
pub mod wav;

pub use buffer::{shared_playback_buffer, PlaybackBuffer, SharedPlaybackBuffer};
pub use config::{PlayerConfig, SinkKind};
pub use controller::PlaybackController;
pub use sink::{AudioSink, ClockSink, SinkEvent};
