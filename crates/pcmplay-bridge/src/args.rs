//! Inbound component arguments.

use pcmplay_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimal playback controls the host may send alongside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostCommand {
    Play,
    Pause,
    Stop,
}

impl HostCommand {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "play" => Some(Self::Play),
            "pause" => Some(Self::Pause),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Arguments of one component render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostArgs {
    /// base64 PCM payload. May be empty.
    pub src: Option<String>,
    pub key: Option<String>,
    /// Replace the current stream instead of appending to it.
    pub reset: bool,
    pub command: Option<HostCommand>,
}

impl HostArgs {
    /// Render arguments carrying a payload.
    pub fn payload(src: impl Into<String>, key: Option<&str>) -> Self {
        Self {
            src: Some(src.into()),
            key: key.map(String::from),
            ..Self::default()
        }
    }

    /// Parse the host's argument object.
    ///
    /// Anything other than a string `src` (or a bare command) is rejected
    /// with [`Error::InvalidInput`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::InvalidInput(format!(
                "expected an argument object, got {}",
                kind_of(value)
            )));
        };

        let key = match map.get("key") {
            None | Some(Value::Null) => None,
            Some(Value::String(key)) => Some(key.clone()),
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "key must be a string or null, got {}",
                    kind_of(other)
                )))
            }
        };

        let reset = match map.get("reset") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(reset)) => *reset,
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "reset must be a boolean, got {}",
                    kind_of(other)
                )))
            }
        };

        let command = match map.get("command") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(HostCommand::parse(name).ok_or_else(|| {
                Error::InvalidInput(format!("unknown command {name:?}"))
            })?),
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "command must be a string, got {}",
                    kind_of(other)
                )))
            }
        };

        let src = match map.get("src") {
            Some(Value::String(src)) => Some(src.clone()),
            None | Some(Value::Null) if command.is_some() => None,
            None | Some(Value::Null) => {
                return Err(Error::InvalidInput("src is missing".to_string()));
            }
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "src must be a string, got {}",
                    kind_of(other)
                )))
            }
        };

        Ok(Self {
            src,
            key,
            reset,
            command,
        })
    }

    /// Payload to load, if the render carries a non-empty one.
    pub fn payload_src(&self) -> Option<&str> {
        self.src.as_deref().filter(|src| !src.is_empty())
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_args() {
        let args = HostArgs::from_value(&json!({"src": "AAD/fw==", "key": "clip"})).unwrap();
        assert_eq!(args, HostArgs::payload("AAD/fw==", Some("clip")));
        assert_eq!(args.payload_src(), Some("AAD/fw=="));
    }

    #[test]
    fn test_null_key_and_flags() {
        let args = HostArgs::from_value(&json!({
            "src": "",
            "key": null,
            "reset": true,
            "command": "pause"
        }))
        .unwrap();
        assert_eq!(args.key, None);
        assert!(args.reset);
        assert_eq!(args.command, Some(HostCommand::Pause));
        assert_eq!(args.payload_src(), None);
    }

    #[test]
    fn test_command_without_src() {
        let args = HostArgs::from_value(&json!({"command": "stop", "key": "a"})).unwrap();
        assert_eq!(args.src, None);
        assert_eq!(args.command, Some(HostCommand::Stop));
    }

    #[test]
    fn test_rejects_bad_input() {
        for value in [
            json!(null),
            json!("AAD/fw=="),
            json!({}),
            json!({"src": null}),
            json!({"src": 42}),
            json!({"src": ["AAD/fw=="]}),
            json!({"src": "AA==", "key": 7}),
            json!({"src": "AA==", "reset": "yes"}),
            json!({"src": "AA==", "command": "rewind"}),
        ] {
            let err = HostArgs::from_value(&value).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{value} -> {err}");
        }
    }
}
