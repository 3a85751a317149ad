//! Host bridge: routes component renders to per-key player sessions.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use pcmplay_audio::{AudioSink, PlaybackController};
use pcmplay_core::{Error, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::args::HostArgs;
use crate::config::BridgeConfig;
use crate::declaration::ComponentDeclaration;
use crate::session::PlayerSession;

/// Integer the component reports back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentValue(pub i32);

impl ComponentValue {
    pub const IDLE: Self = Self(0);

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<StatusCode> for ComponentValue {
    fn from(status: StatusCode) -> Self {
        Self(status.value())
    }
}

impl From<&Error> for ComponentValue {
    fn from(err: &Error) -> Self {
        StatusCode::from(err).into()
    }
}

/// Builds the sink for each new session.
pub type SinkFactory = Arc<dyn Fn() -> Box<dyn AudioSink> + Send + Sync>;

/// Adapter between the host's render calls and the playback sessions.
pub struct HostBridge {
    config: BridgeConfig,
    sessions: DashMap<Option<String>, Arc<Mutex<PlayerSession>>>,
    factory: Option<SinkFactory>,
}

impl HostBridge {
    /// Sessions use the sink named in the player config.
    pub fn new(config: BridgeConfig) -> Self {
        info!(
            "Host bridge ready for {} ({})",
            crate::declaration::COMPONENT_NAME,
            if config.source.is_release() { "release" } else { "dev" }
        );
        Self {
            config,
            sessions: DashMap::new(),
            factory: None,
        }
    }

    /// Sessions drain into sinks built by `factory`.
    pub fn with_sink_factory(config: BridgeConfig, factory: SinkFactory) -> Self {
        Self {
            factory: Some(factory),
            ..Self::new(config)
        }
    }

    pub fn declaration(&self) -> ComponentDeclaration {
        ComponentDeclaration::new(self.config.source.clone())
    }

    /// Handle one render call and return the value to report.
    ///
    /// Arguments that fail to parse yield the invalid-input code without
    /// touching any session.
    pub fn deliver(&self, raw: &Value) -> ComponentValue {
        let args = match HostArgs::from_value(raw) {
            Ok(args) => args,
            Err(e) => {
                warn!("Rejected component arguments: {e}");
                return ComponentValue::from(&e);
            }
        };
        self.render(&args)
    }

    /// Apply already-parsed arguments to their session.
    ///
    /// The map entry is released before the session runs, so a slow sink
    /// only blocks renders for its own key.
    pub fn render(&self, args: &HostArgs) -> ComponentValue {
        let session = self
            .sessions
            .entry(args.key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(self.open_session(args.key.clone()))))
            .clone();
        let status = session.lock().handle(args);
        status.into()
    }

    fn open_session(&self, key: Option<String>) -> PlayerSession {
        debug!("Opening session {key:?}");
        let player = self.config.player.clone();
        let controller = match &self.factory {
            Some(factory) => PlaybackController::with_sink(player, factory()),
            None => PlaybackController::new(player),
        };
        PlayerSession::new(key, controller)
    }

    /// Current value of a session, or the default for unknown keys.
    pub fn value(&self, key: Option<&str>) -> ComponentValue {
        let key = key.map(String::from);
        let session = self.sessions.get(&key).map(|entry| Arc::clone(entry.value()));
        session.map_or(ComponentValue::IDLE, |session| session.lock().value().into())
    }

    /// Tear down a session. Returns false if the key was not mounted.
    pub fn unmount(&self, key: Option<&str>) -> bool {
        let key = key.map(String::from);
        match self.sessions.remove(&key) {
            Some((_, session)) => {
                session.lock().close();
                debug!("Closed session {key:?}");
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
