//! Playback state and the numeric status reported to the host.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, ErrorKind};

/// Playback state of a player session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    /// Status code sent to the host for this state.
    pub const fn code(self) -> i32 {
        match self {
            Self::Idle => 0,
            Self::Loading => 1,
            Self::Playing => 2,
            Self::Paused => 3,
            Self::Stopped => 4,
            Self::Ready => 5,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Value reported to the host: a state, or a negative error code.
///
/// Serializes as a bare JSON number, matching the component's default of `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum StatusCode {
    State(PlaybackState),
    Failed(ErrorKind),
}

impl StatusCode {
    pub const IDLE: Self = Self::State(PlaybackState::Idle);

    pub const fn value(self) -> i32 {
        match self {
            Self::State(state) => state.code(),
            Self::Failed(kind) => kind.code(),
        }
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::IDLE
    }
}

impl From<PlaybackState> for StatusCode {
    fn from(state: PlaybackState) -> Self {
        Self::State(state)
    }
}

impl From<&Error> for StatusCode {
    fn from(err: &Error) -> Self {
        Self::Failed(err.kind())
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> Self {
        status.value()
    }
}

impl TryFrom<i32> for StatusCode {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let state = match value {
            0 => PlaybackState::Idle,
            1 => PlaybackState::Loading,
            2 => PlaybackState::Playing,
            3 => PlaybackState::Paused,
            4 => PlaybackState::Stopped,
            5 => PlaybackState::Ready,
            other => {
                return ErrorKind::from_code(other)
                    .map(Self::Failed)
                    .ok_or_else(|| format!("unknown status code {other}"));
            }
        };
        Ok(Self::State(state))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_state_codes() {
        assert_eq!(PlaybackState::Idle.code(), 0);
        assert_eq!(PlaybackState::Loading.code(), 1);
        assert_eq!(PlaybackState::Playing.code(), 2);
        assert_eq!(PlaybackState::Paused.code(), 3);
        assert_eq!(PlaybackState::Stopped.code(), 4);
        assert_eq!(PlaybackState::Ready.code(), 5);
    }

    #[test]
    fn test_status_serializes_as_number() {
        let json = serde_json::to_string(&StatusCode::State(PlaybackState::Stopped)).unwrap();
        assert_eq!(json, "4");

        let json = serde_json::to_string(&StatusCode::Failed(ErrorKind::InvalidInput)).unwrap();
        assert_eq!(json, "-3");

        let parsed: StatusCode = serde_json::from_str("-2").unwrap();
        assert_eq!(parsed, StatusCode::Failed(ErrorKind::MalformedStream));
        assert!(serde_json::from_str::<StatusCode>("42").is_err());
    }

    #[test]
    fn test_default_status_is_idle() {
        assert_eq!(StatusCode::default().value(), 0);
        assert_eq!(StatusCode::default(), StatusCode::IDLE);
    }
}
