//! Bridge configuration.

use std::path::Path;

use pcmplay_audio::PlayerConfig;
use pcmplay_core::Result;
use serde::{Deserialize, Serialize};

use crate::declaration::BuildSource;

/// Process-wide settings, fixed when the bridge is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Settings for each session's player.
    pub player: PlayerConfig,
    pub source: BuildSource,
}

impl BridgeConfig {
    /// Load from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
