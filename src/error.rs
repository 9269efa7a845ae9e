use thiserror::Error;

/// Failures of a single location fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission not granted")]
    PermissionDenied,

    #[error("Location request failed: {0}")]
    Platform(String),

    #[error("A location request is already in flight")]
    AlreadyPending,

    #[error("The location request was dropped without an answer")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to start transport: {0}")]
    TransportStart(String),

    #[error("Failed to toggle microphone: {0}")]
    MicToggle(String),

    #[error("{0}")]
    Transport(String),

    #[error("Invalid tool call: {0}")]
    ToolCall(String),

    #[error("Failed to parse or serialize JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("The session controller has shut down")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
