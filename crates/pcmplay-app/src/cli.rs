//! Command-line interface definitions.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pcmplay_audio::{PlayerConfig, SinkKind};
use pcmplay_bridge::{BridgeConfig, BuildSource};

#[derive(Parser, Debug)]
#[command(name = "pcmplay", version, about = "Stream raw 16 kHz mono s16le PCM")]
pub struct Cli {
    #[command(flatten)]
    pub player: PlayerArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command that builds a player.
#[derive(Args, Debug, Clone, Default)]
pub struct PlayerArgs {
    /// JSON config file (player settings, or a bridge config for `bridge`)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Drain audio on a clock instead of opening an output device
    #[arg(long, global = true)]
    pub headless: bool,

    /// Playback buffer length in milliseconds
    #[arg(long, global = true)]
    pub buffer_ms: Option<u64>,

    /// Start playing as soon as audio is buffered
    #[arg(long, global = true)]
    pub autoplay: bool,
}

impl PlayerArgs {
    /// Player config from `--config`, with flags applied on top.
    pub fn player_config(&self) -> Result<PlayerConfig> {
        let config = match &self.config {
            Some(path) => PlayerConfig::from_json_file(path)
                .with_context(|| format!("loading player config {}", path.display()))?,
            None => PlayerConfig::default(),
        };
        Ok(self.apply(config))
    }

    /// Bridge config from `--config`, with flags applied to its player.
    pub fn bridge_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::from_json_file(path)
                .with_context(|| format!("loading bridge config {}", path.display()))?,
            None => BridgeConfig::default(),
        };
        config.player = self.apply(config.player);
        Ok(config)
    }

    fn apply(&self, mut config: PlayerConfig) -> PlayerConfig {
        if self.headless {
            config.sink = SinkKind::clock();
        }
        if self.autoplay {
            config.autoplay = true;
        }
        if let Some(ms) = self.buffer_ms {
            config = config.with_buffer_duration(Duration::from_millis(ms));
        }
        config
    }
}

/// Where the component frontend is served from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Use a frontend dev server instead of the bundled build
    #[arg(long, num_args = 0..=1, default_missing_value = pcmplay_bridge::declaration::DEFAULT_DEV_URL)]
    pub dev_url: Option<String>,

    /// Package directory containing `frontend/build`
    #[arg(long, conflicts_with = "dev_url")]
    pub build_dir: Option<PathBuf>,
}

impl SourceArgs {
    /// The source named by the flags, if any.
    pub fn source(&self) -> Option<BuildSource> {
        if let Some(url) = &self.dev_url {
            return Some(BuildSource::LocalDevServer { url: url.clone() });
        }
        self.build_dir.as_ref().map(BuildSource::bundled_in)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a raw PCM, base64 or WAV file
    Play {
        path: PathBuf,

        /// The file holds base64 text rather than raw bytes
        #[arg(long)]
        base64: bool,

        /// Feed the player in chunks of this many milliseconds
        #[arg(long, default_value_t = 200)]
        chunk_ms: u64,
    },

    /// Wrap a raw PCM (or base64) file in a WAV header
    ExportWav {
        input: PathBuf,
        output: PathBuf,

        /// The input holds base64 text rather than raw bytes
        #[arg(long)]
        base64: bool,
    },

    /// Print the component declaration as JSON
    Declare {
        #[command(flatten)]
        source: SourceArgs,

        /// Fail if the bundled build is missing
        #[arg(long)]
        check: bool,
    },

    /// Serve host messages as JSON lines on stdin/stdout
    Bridge {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List audio output devices
    Devices,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_parse_play() {
        let cli = Cli::try_parse_from([
            "pcmplay",
            "--headless",
            "play",
            "clip.pcm",
            "--buffer-ms",
            "500",
        ])
        .unwrap();
        assert!(cli.player.headless);
        assert_eq!(cli.player.buffer_ms, Some(500));
        assert!(matches!(cli.command, Command::Play { chunk_ms: 200, base64: false, .. }));

        let config = cli.player.player_config().unwrap();
        assert_eq!(config.sink, SinkKind::clock());
        assert_eq!(config.buffer_capacity, 8_000);
    }

    #[test]
    fn test_dev_url_default() {
        let cli = Cli::try_parse_from(["pcmplay", "declare", "--dev-url"]).unwrap();
        let Command::Declare { source, .. } = cli.command else {
            panic!("expected declare");
        };
        assert_eq!(source.source(), Some(BuildSource::dev_server()));
    }

    #[test]
    fn test_source_flags_conflict() {
        assert!(Cli::try_parse_from([
            "pcmplay",
            "bridge",
            "--dev-url",
            "http://localhost:3001",
            "--build-dir",
            "/opt/pkg",
        ])
        .is_err());
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.json");
        std::fs::write(&path, r#"{"buffer_capacity": 100, "autoplay": true}"#).unwrap();

        let args = PlayerArgs {
            config: Some(path),
            headless: true,
            ..PlayerArgs::default()
        };
        let config = args.player_config().unwrap();
        assert_eq!(config.buffer_capacity, 100);
        assert!(config.autoplay);
        assert_eq!(config.sink, SinkKind::clock());
    }
}
