//! Bounded buffers between the payload producer and the audio sink.

pub mod ring;

pub use ring::{shared_playback_buffer, Popped, PlaybackBuffer, PushOutcome, SharedPlaybackBuffer};
