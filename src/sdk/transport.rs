use crate::Result;
use crate::protocol::{ToolCall, TransportEvent, TransportState};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use url::Url;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const DEFAULT_CONNECT_ENDPOINT: &str = "/connect";

/// Realtime voice client. Implementations report callbacks through the
/// [`EventSink`] they were created with.
pub trait Transport: Send + Sync {
    fn start(&self) -> BoxFuture<'_, Result<()>>;
    fn disconnect(&self) -> BoxFuture<'_, Result<()>>;
    fn set_mic_enabled(&self, enabled: bool) -> BoxFuture<'_, Result<()>>;
    fn update_mic(&self, mic_id: String) -> BoxFuture<'_, Result<()>>;
    fn is_mic_enabled(&self) -> bool;
    /// Session expiry in unix seconds, once known.
    fn expiry(&self) -> Option<i64>;
}

pub trait TransportFactory: Send + Sync {
    /// # Errors
    /// Returns an error if the client cannot be constructed.
    #[allow(clippy::result_large_err)]
    fn create(&self, config: TransportConfig, events: EventSink) -> Result<Arc<dyn Transport>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub base_url: String,
    pub connect_endpoint: String,
    pub enable_mic: bool,
    pub enable_cam: bool,
}

impl TransportConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, enable_mic: bool) -> Self {
        Self {
            base_url: base_url.into(),
            connect_endpoint: DEFAULT_CONNECT_ENDPOINT.to_string(),
            enable_mic,
            enable_cam: false,
        }
    }

    /// Absolute URL of the backend endpoint that hands out session credentials.
    ///
    /// # Errors
    /// Returns an error if the base URL is not a valid absolute URL.
    #[allow(clippy::result_large_err)]
    pub fn connect_url(&self) -> Result<Url> {
        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(self.connect_endpoint.trim_start_matches('/'))?)
    }
}

/// Delegate handed to a transport. Cheap to clone; events sent after the
/// controller has shut down, or after the transport was replaced, are dropped.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
    generation: u64,
}

impl EventSink {
    pub(crate) const fn new(
        tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
        generation: u64,
    ) -> Self {
        Self { tx, generation }
    }

    pub fn emit(&self, event: TransportEvent) {
        if self.tx.send((self.generation, event)).is_err() {
            tracing::debug!("transport event dropped, session controller is gone");
        }
    }

    pub fn status_changed(&self, state: TransportState) {
        self.emit(TransportEvent::StatusChanged(state));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(TransportEvent::Error(message.into()));
    }

    /// Forward a tool call; the returned receiver yields its single result.
    pub fn tool_call(&self, call: ToolCall) -> oneshot::Receiver<Value> {
        let (respond, rx) = oneshot::channel();
        self.emit(TransportEvent::ToolCall { call, respond });
        rx
    }
}
