//! One player per component instance.

use pcmplay_audio::PlaybackController;
use pcmplay_core::StatusCode;
use tracing::debug;

use crate::args::{HostArgs, HostCommand};

/// A mounted component: its controller and the last value it reported.
pub struct PlayerSession {
    key: Option<String>,
    controller: PlaybackController,
}

impl PlayerSession {
    pub const fn new(key: Option<String>, controller: PlaybackController) -> Self {
        Self { key, controller }
    }

    /// Apply one render's arguments and return the value to report.
    ///
    /// Errors are already folded into the controller's status, so they are
    /// only logged here.
    pub fn handle(&mut self, args: &HostArgs) -> StatusCode {
        self.controller.pump();

        if let Some(src) = args.payload_src() {
            if let Err(e) = self.controller.load(src, args.reset) {
                debug!("Session {:?} payload rejected: {e}", self.key);
            }
        }

        match args.command {
            Some(HostCommand::Play) => {
                if let Err(e) = self.controller.play() {
                    debug!("Session {:?} failed to play: {e}", self.key);
                }
            }
            Some(HostCommand::Pause) => self.controller.pause(),
            Some(HostCommand::Stop) => self.controller.stop(),
            None => {}
        }

        self.controller.status()
    }

    /// Latest value, after applying pending sink events.
    pub fn value(&mut self) -> StatusCode {
        self.controller.pump();
        self.controller.status()
    }

    /// Halt playback before the session is dropped.
    pub fn close(&mut self) {
        self.controller.stop();
    }
}
