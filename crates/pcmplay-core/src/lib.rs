//! # pcmplay-core
//!
//! Core types, the fixed PCM stream format, and error handling shared by the
//! pcmplay crates.

pub mod error;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use types::*;
