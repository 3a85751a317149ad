//! JSON-lines transport between a host process and the bridge.
//!
//! Each input line is one [`HostMessage`]; each produces exactly one
//! [`HostReply`] line.

use std::io::{BufRead, Write};

use pcmplay_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::bridge::{ComponentValue, HostBridge};

/// A message from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum HostMessage {
    /// The component was rendered with these arguments.
    Render { args: Value },
    /// The component left the page.
    Unmount {
        #[serde(default)]
        key: Option<String>,
    },
    /// Ask for the latest value without rendering.
    Poll {
        #[serde(default)]
        key: Option<String>,
    },
}

/// The value reported for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReply {
    pub key: Option<String>,
    pub value: ComponentValue,
}

impl HostBridge {
    /// Apply one host message.
    pub fn dispatch(&self, message: &HostMessage) -> HostReply {
        match message {
            HostMessage::Render { args } => HostReply {
                key: args.get("key").and_then(Value::as_str).map(String::from),
                value: self.deliver(args),
            },
            HostMessage::Unmount { key } => {
                self.unmount(key.as_deref());
                HostReply {
                    key: key.clone(),
                    value: ComponentValue::IDLE,
                }
            }
            HostMessage::Poll { key } => HostReply {
                key: key.clone(),
                value: self.value(key.as_deref()),
            },
        }
    }
}

/// Serve messages from `reader` until end of input.
///
/// Lines that are not valid messages get an invalid-input reply.
pub fn serve<R: BufRead, W: Write>(bridge: &HostBridge, reader: R, mut writer: W) -> Result<()> {
    info!("Serving host messages");
    let mut handled = 0usize;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<HostMessage>(line) {
            Ok(message) => bridge.dispatch(&message),
            Err(e) => {
                let err = Error::InvalidInput(format!("bad host message: {e}"));
                warn!("{err}");
                HostReply {
                    key: None,
                    value: ComponentValue::from(&err),
                }
            }
        };

        serde_json::to_writer(&mut writer, &reply)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        handled += 1;
    }

    debug!("Host closed the channel after {handled} messages");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::bridge::SinkFactory;
    use crate::config::BridgeConfig;
    use pcmplay_audio::{AudioSink, ClockSink};
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    fn clock_bridge() -> HostBridge {
        let factory: SinkFactory =
            Arc::new(|| -> Box<dyn AudioSink> { Box::new(ClockSink::new(Duration::from_millis(50))) });
        HostBridge::with_sink_factory(BridgeConfig::default(), factory)
    }

    fn run(input: &str) -> Vec<HostReply> {
        let bridge = clock_bridge();
        let mut output = Vec::new();
        serve(&bridge, Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_render_poll_unmount() {
        let replies = run(concat!(
            r#"{"event":"render","args":{"src":"AAD/fw==","key":"clip"}}"#,
            "\n",
            r#"{"event":"poll","key":"clip"}"#,
            "\n\n",
            r#"{"event":"unmount","key":"clip"}"#,
            "\n",
            r#"{"event":"poll","key":"clip"}"#,
            "\n",
        ));

        let values: Vec<i32> = replies.iter().map(|r| r.value.get()).collect();
        assert_eq!(values, vec![5, 5, 0, 0]);
        assert_eq!(replies[0].key.as_deref(), Some("clip"));
    }

    #[test]
    fn test_bad_lines_get_invalid_input() {
        let replies = run(concat!(
            "not json\n",
            r#"{"event":"seek"}"#,
            "\n",
            r#"{"event":"render","args":{"src":7}}"#,
            "\n",
        ));

        assert_eq!(replies.len(), 3);
        assert!(replies.iter().all(|r| r.value.get() == -3));
    }

    #[test]
    fn test_reply_shape() {
        let reply = HostReply {
            key: None,
            value: ComponentValue(2),
        };
        assert_eq!(
            serde_json::to_string(&reply).unwrap(),
            r#"{"key":null,"value":2}"#
        );
    }
}
