//! Core domain types for pcmplay.

pub mod descriptor;
pub mod frame;
pub mod state;

pub use descriptor::{PcmDescriptor, SampleFormat};
pub use frame::{AudioFrame, MAX_CHANNELS};
pub use state::{PlaybackState, StatusCode};
