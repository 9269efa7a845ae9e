use crate::protocol::TransportState;

/// Snapshot of everything the call UI renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub status: TransportState,
    pub is_bot_ready: bool,
    pub is_mic_enabled: bool,
    /// Seconds left until the session expires. May go negative.
    pub timer_count: i64,
    pub local_audio_level: f32,
    pub remote_audio_level: f32,
    /// Transient message shown to the user; cleared a few seconds after it is set.
    pub error_message: Option<String>,
}

impl SessionState {
    #[must_use]
    pub const fn is_in_call(&self) -> bool {
        self.status.is_in_call()
    }

    #[must_use]
    pub const fn show_error(&self) -> bool {
        self.error_message.is_some()
    }
}
