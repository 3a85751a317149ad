//! # pcmplay-bridge
//!
//! Adapter between a host component framework and the playback engine.
//!
//! The host declares a `pcm_audio_player` component, renders it with a
//! base64 `src` and an optional `key`, and reads back one number per render.
//! This crate only marshals those messages; decoding and buffering happen in
//! `pcmplay-audio`.

pub mod args;
pub mod bridge;
pub mod channel;
pub mod config;
pub mod declaration;
pub mod session;

pub use args::{HostArgs, HostCommand};
pub use bridge::{ComponentValue, HostBridge, SinkFactory};
pub use config::BridgeConfig;
pub use declaration::{BuildSource, ComponentDeclaration};
pub use session::PlayerSession;
