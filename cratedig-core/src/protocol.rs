//! Websocket message shapes exchanged with the media server.
//!
//! Client intents are `{"action": ..., "payload": {...}}`; server pushes are
//! flat objects discriminated by `status`.

use crate::error::Result;
use crate::library::{GroupingMode, SortMode};
use crate::navigation::ViewState;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

const LOG_TARGET: &str = "cratedig::protocol";

/// Payload for intents that carry no data (`{}` on the wire).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyPayload {}

/// Intents sent to the server. Playback is server-authoritative; these only
/// request changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    Play {
        file_path: String,
        title: String,
        artist: String,
        /// Offset into the track in seconds
        start_time: f64,
    },
    Pause(EmptyPayload),
    Stop(EmptyPayload),
    Volume {
        value: f64,
    },
    UpdateNav(NavSnapshot),
}

impl ClientMessage {
    #[must_use]
    pub const fn pause() -> Self {
        Self::Pause(EmptyPayload {})
    }

    #[must_use]
    pub const fn stop() -> Self {
        Self::Stop(EmptyPayload {})
    }

    /// The wire `action` name, for logging.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Play { .. } => "PLAY",
            Self::Pause(_) => "PAUSE",
            Self::Stop(_) => "STOP",
            Self::Volume { .. } => "VOLUME",
            Self::UpdateNav(_) => "UPDATE_NAV",
        }
    }

    /// Serialize to the JSON text frame sent on the socket.
    ///
    /// # Errors
    ///
    /// Returns an error if a float field is not representable in JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Serializable description of where the user is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavSnapshot {
    #[serde(default)]
    pub sort_mode: SortMode,
    #[serde(default, deserialize_with = "lenient_index")]
    pub crate_index: usize,
    #[serde(default)]
    pub album_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_index")]
    pub disc_index: usize,
    #[serde(default)]
    pub view_state: ViewState,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default = "default_ascending", rename = "sortAscending")]
    pub ascending: bool,
    #[serde(default)]
    pub grouping_mode: GroupingMode,
}

const fn default_ascending() -> bool {
    true
}

/// Stored snapshots may carry `-1` for "no selection"; read negatives and
/// nulls as 0 and let replay clamp the rest.
fn lenient_index<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|index| usize::try_from(index).ok()).unwrap_or(0))
}

impl Default for NavSnapshot {
    fn default() -> Self {
        Self {
            sort_mode: SortMode::default(),
            crate_index: 0,
            album_id: None,
            disc_index: 0,
            view_state: ViewState::default(),
            accent_color: None,
            ascending: default_ascending(),
            grouping_mode: GroupingMode::default(),
        }
    }
}

/// What the server reports as currently playing when a client connects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSync {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
}

/// Messages pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Sent on every (re)connect to restore the session
    Sync {
        #[serde(default)]
        playback: Option<PlaybackSync>,
        #[serde(default)]
        navigation: Option<NavSnapshot>,
    },
    Playing {
        #[serde(default)]
        track: Option<String>,
        #[serde(default)]
        artist: Option<String>,
    },
    Paused,
    Stopped,
    /// The current track ended on the server
    Finished,
    Error {
        #[serde(default)]
        message: String,
    },
}

impl ServerMessage {
    /// Parse one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or has an unknown `status`.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Outbound half handed to the state machine and playback session.
///
/// Sends never block and never fail from the caller's point of view; the
/// network channel decides whether a message actually leaves the process.
#[derive(Debug, Clone)]
pub struct MessageSink {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl MessageSink {
    #[must_use]
    pub const fn new(tx: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self { tx }
    }

    /// A sink plus the receiver the transport drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn send(&self, message: ClientMessage) {
        let action = message.action();
        if self.tx.send(message).is_err() {
            debug!(target: LOG_TARGET, "Transport gone, discarding {action}");
        }
    }
}
