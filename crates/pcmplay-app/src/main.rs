//! # pcmplay
//!
//! Command-line front end for the streaming PCM player: plays files, exports
//! WAV, and serves the `pcm_audio_player` component bridge.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays free for the bridge channel
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pcmplay=info,pcmplay_app=info,pcmplay_audio=info,pcmplay_bridge=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting pcmplay v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Play {
            path,
            base64,
            chunk_ms,
        } => commands::play(&cli.player, &path, base64, chunk_ms),
        Command::ExportWav {
            input,
            output,
            base64,
        } => commands::export_wav(&input, &output, base64),
        Command::Declare { source, check } => commands::declare(&cli.player, &source, check),
        Command::Bridge { source } => commands::bridge(&cli.player, &source),
        Command::Devices => commands::devices(),
    }
}
