use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection status reported by the transport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    #[default]
    Disconnected,
    Initializing,
    Initialized,
    Authenticating,
    Connecting,
    Connected,
    Ready,
    Disconnecting,
    Error,
}

impl TransportState {
    /// Whether a call is in progress from the user's point of view.
    #[must_use]
    pub const fn is_in_call(self) -> bool {
        matches!(
            self,
            Self::Authenticating | Self::Connecting | Self::Connected | Self::Ready
        )
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Authenticating => "authenticating",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Ready => "ready",
            Self::Disconnecting => "disconnecting",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
