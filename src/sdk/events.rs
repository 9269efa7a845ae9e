use crate::protocol::Tracks;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Conversation activity forwarded to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A final user transcript. Partial transcripts are not forwarded.
    UserTranscript { text: String },
    BotTranscript { text: String },
    TracksUpdated { tracks: Tracks },
    ToolCallResolved { name: String, result: Value },
}

pub struct EventStream<'a> {
    rx: &'a mut mpsc::Receiver<SessionEvent>,
}

impl<'a> EventStream<'a> {
    #[must_use]
    pub const fn new(rx: &'a mut mpsc::Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl Stream for EventStream<'_> {
    type Item = SessionEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Non-blocking publish; a slow consumer loses events instead of stalling the session.
pub(crate) fn publish(tx: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    if let Err(err) = tx.try_send(event) {
        tracing::debug!("session event not delivered: {err}");
    }
}
