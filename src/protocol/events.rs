use super::status::TransportState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Participant {
    pub id: String,
    pub name: Option<String>,
    pub local: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    /// Absent on some transports; treated as not final.
    #[serde(rename = "final")]
    pub is_final: Option<bool>,
}

impl Transcript {
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.is_final.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ParticipantTracks {
    pub audio: Option<String>,
    pub video: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Tracks {
    pub local: ParticipantTracks,
    pub bot: Option<ParticipantTracks>,
}

/// A function invocation requested by the bot.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Callbacks a transport delivers to the session controller.
#[derive(Debug)]
pub enum TransportEvent {
    StatusChanged(TransportState),
    /// The bot finished joining. `expires_at` is the session expiry in unix seconds.
    BotReady { expires_at: Option<i64> },
    Connected,
    Disconnected,
    RemoteAudioLevel { level: f32, participant: Participant },
    UserAudioLevel(f32),
    UserTranscript(Transcript),
    BotTranscript(String),
    /// `respond` must receive exactly one result.
    ToolCall {
        call: ToolCall,
        respond: oneshot::Sender<Value>,
    },
    Error(String),
    TracksUpdated(Tracks),
}

impl TransportEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StatusChanged(_) => "status_changed",
            Self::BotReady { .. } => "bot_ready",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::RemoteAudioLevel { .. } => "remote_audio_level",
            Self::UserAudioLevel(_) => "user_audio_level",
            Self::UserTranscript(_) => "user_transcript",
            Self::BotTranscript(_) => "bot_transcript",
            Self::ToolCall { .. } => "tool_call",
            Self::Error(_) => "error",
            Self::TracksUpdated(_) => "tracks_updated",
        }
    }
}
